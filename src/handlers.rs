use crate::{
    errors::{AppError, FormError, ValidationError},
    image_generator::GeneratorView,
    navigation::{Gate, Navigation},
    post_form::{PostDraft, PostForm},
    registration::{RegistrationDraft, RegistrationForm},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing;

#[derive(Deserialize, Debug)]
pub struct GenerateImagesForm {
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct SessionForm {
    pub user_id: String,
}

/// Handler for GET /pages/register
pub async fn open_registration(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let gate = RegistrationForm::open(state.session.as_ref(), state.api.clone(), state.mailer.clone()).await?;
    match gate {
        Gate::Redirect(page) => {
            // A page opened before signing in must not stay submittable.
            *state.registration_page.lock().await = None;
            Ok(Redirect::to(state.config.page_url(page)).into_response())
        }
        Gate::Open(form) => {
            // Replaces any earlier page along with its email snapshot.
            *state.registration_page.lock().await = Some(form);
            Ok(Json(serde_json::json!({
                "page": "register",
                "draft": RegistrationDraft::default(),
            }))
            .into_response())
        }
    }
}

/// Handler for POST /pages/register
pub async fn submit_registration(
    State(state): State<Arc<AppState>>,
    Json(mut draft): Json<RegistrationDraft>,
) -> Result<impl IntoResponse, AppError> {
    // Held through the backend call, submits are serialized.
    let mut page = state.registration_page.lock().await;
    let form = page.as_mut().ok_or(AppError::PageNotOpen("registration"))?;

    // The email task runs detached.
    let registered = form.submit(&mut draft).await?;
    tracing::info!(email = %registered.email, "Registration submitted via handler");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "registered": registered.email,
            "draft": draft,
        })),
    ))
}

/// Handler for GET /pages/posts/new
pub async fn open_post_page(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let gate = PostForm::open(
        state.session.as_ref(),
        state.api.clone(),
        state.mailer.clone(),
        state.generator.subscribe(),
    )
    .await;

    match gate {
        Gate::Redirect(page) => {
            *state.post_page.write().await = None;
            Ok(Redirect::to(state.config.page_url(page)).into_response())
        }
        Gate::Open(form) => {
            // A fresh page starts with an idle generator and no cover.
            state.generator.reset().await;
            let draft = form.draft();
            *state.post_page.write().await = Some(Arc::new(form));
            Ok(Json(serde_json::json!({
                "page": "new_post",
                "draft": draft,
                "images": state.generator.view().await,
            }))
            .into_response())
        }
    }
}

async fn open_post_form(state: &AppState) -> Result<Arc<PostForm>, AppError> {
    state
        .post_page
        .read()
        .await
        .clone()
        .ok_or(AppError::PageNotOpen("new post"))
}

/// Handler for POST /pages/posts/new
pub async fn submit_post(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<PostDraft>,
) -> Result<Response, AppError> {
    let form = open_post_form(&state).await?;

    // Validation and the in-progress guard run inside the form.
    // Notifications keep running after the handle is dropped.
    let submission = form.submit(&draft).await?;
    let Navigation::To(page) = submission.navigation;
    tracing::info!(user_id = %form.user_id(), "Post submitted via handler");

    Ok(Redirect::to(state.config.page_url(page)).into_response())
}

/// The generator view is the answer either way; failures only change the
/// status, the user-facing message is already in the view.
async fn view_response(state: &AppState, result: Result<GeneratorView, FormError>) -> Response {
    match result {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "Image generator operation failed");
            (e.status(), Json(state.generator.view().await)).into_response()
        }
    }
}

/// Handler for GET /pages/posts/new/images
pub async fn get_images(State(state): State<Arc<AppState>>) -> Result<Json<GeneratorView>, AppError> {
    open_post_form(&state).await?;
    Ok(Json(state.generator.view().await))
}

/// Handler for POST /pages/posts/new/images
pub async fn generate_images(
    State(state): State<Arc<AppState>>,
    Json(form): Json<GenerateImagesForm>,
) -> Result<Response, AppError> {
    open_post_form(&state).await?;
    let result = state.generator.generate(&form.title).await;
    Ok(view_response(&state, result).await)
}

/// Handler for POST /pages/posts/new/images/{slot}/select
pub async fn select_image(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<usize>,
) -> Result<Response, AppError> {
    open_post_form(&state).await?;
    let result = state.generator.select(slot).await;
    Ok(view_response(&state, result).await)
}

/// Handler for POST /pages/posts/new/images/{slot}/load-error
pub async fn image_load_error(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<usize>,
) -> Result<Response, AppError> {
    open_post_form(&state).await?;
    let result = state.generator.report_load_error(slot).await;
    Ok(view_response(&state, result).await)
}

/// Handler for GET /assets/images/fallback/{key}
pub async fn get_fallback_image(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    tracing::debug!(asset_key = %key, "Serving fallback image via handler");
    let (data, content_type) = state.assets.download(&key).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// Handler for POST /session
pub async fn store_session(
    State(state): State<Arc<AppState>>,
    Json(form): Json<SessionForm>,
) -> Result<StatusCode, AppError> {
    let user_id = form.user_id.trim();
    if user_id.is_empty() {
        return Err(ValidationError::FormConstraints.into());
    }
    state.session.store(user_id).await?;

    // Signed-in users are not allowed to register.
    *state.registration_page.lock().await = None;
    tracing::info!(%user_id, "Session stored via handler");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for DELETE /session
pub async fn clear_session(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.session.clear().await?;

    // The post page is gated on the session, close it and drop any pending
    // generation.
    *state.post_page.write().await = None;
    state.generator.reset().await;
    tracing::info!("Session cleared via handler");
    Ok(StatusCode::NO_CONTENT)
}

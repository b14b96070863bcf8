use crate::{handlers, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/pages/register",
            get(handlers::open_registration).post(handlers::submit_registration),
        )
        .route(
            "/pages/posts/new",
            get(handlers::open_post_page).post(handlers::submit_post),
        )
        .route(
            "/pages/posts/new/images",
            get(handlers::get_images).post(handlers::generate_images),
        )
        .route("/pages/posts/new/images/{slot}/select", post(handlers::select_image))
        .route("/pages/posts/new/images/{slot}/load-error", post(handlers::image_load_error))
        .route("/assets/images/fallback/{key}", get(handlers::get_fallback_image))
        .route(
            "/session",
            post(handlers::store_session).delete(handlers::clear_session),
        )
        // Middleware Layers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(state)
}

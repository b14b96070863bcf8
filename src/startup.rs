use crate::{
    config::Config,
    domain::{BlogApi, ImageService, Mailer},
    http_client::create_http_client,
    image_generator::{GeneratorSettings, ImageGenerator},
    image_service::HttpImageService,
    mailer::{HttpMailer, LogMailer},
    repositories::HttpBlogApi,
    routes::create_router,
    session::FileSessionStore,
    storage::LocalAssets,
    AppState,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Wires the HTTP collaborators and the page state from configuration.
pub async fn build_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Startup: Initializing collaborators...");
    let client = create_http_client(&config).context("Startup: Failed to build HTTP client")?;

    let api: Arc<dyn BlogApi> = Arc::new(HttpBlogApi::new(client.clone(), config.blog_api_url.clone()));
    let images: Arc<dyn ImageService> =
        Arc::new(HttpImageService::new(client.clone(), config.image_api_url.clone()));
    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => {
            tracing::info!(endpoint = %mail.endpoint, "Startup: Using mail relay");
            Arc::new(HttpMailer::new(client, mail.clone()))
        }
        None => {
            tracing::warn!("Startup: MAIL_API_URL not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };

    let assets = LocalAssets::new(config.fallback_dir.clone());
    if let Err(e) = assets.check().await {
        // The generator still works; only the fallback images will 404.
        tracing::warn!("Startup: {:#}", e);
    }

    let generator = Arc::new(ImageGenerator::new(images, GeneratorSettings::from_config(&config)));
    let session = Arc::new(FileSessionStore::new(config.session_dir.clone()));

    tracing::info!("Startup: Initialization complete.");
    Ok(Arc::new(AppState {
        config,
        api,
        mailer,
        session,
        assets,
        generator,
        post_page: RwLock::new(None),
        registration_page: Mutex::new(None),
    }))
}

/// Builds the state and serves the router until the process stops.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.bind_address;
    let state = build_state(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("Server terminated with an error")?;
    Ok(())
}

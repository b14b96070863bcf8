use crate::{
    domain::ImageService,
    errors::ApiError,
    http_client::read_json,
    models::{GenerateImagesRequest, GenerateImagesResponse, GeneratedImage},
};
use async_trait::async_trait;

const GENERATE_PATH: &str = "/api/generate-images";

/// `ImageService` backed by `POST /api/generate-images`.
#[derive(Debug, Clone)]
pub struct HttpImageService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageService {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ImageService for HttpImageService {
    async fn generate(&self, request: &GenerateImagesRequest) -> Result<Vec<GeneratedImage>, ApiError> {
        tracing::debug!(title = %request.title, count = request.count, "Requesting generated images");

        let response = self
            .client
            .post(format!("{}{}", self.base_url, GENERATE_PATH))
            .json(request)
            .send()
            .await?;
        // HTTP errors surface as ApiError::Status
        let body: GenerateImagesResponse = read_json(response).await?;

        // A 200 can still carry success: false
        if !body.success {
            let message = body.message.unwrap_or_else(|| "Image generation failed".to_string());
            tracing::warn!(%message, "Image service rejected the request");
            return Err(ApiError::Rejected(message));
        }

        tracing::debug!(images = body.images.len(), "Image service answered");
        Ok(body.images)
    }
}

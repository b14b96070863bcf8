use crate::config::Config;
use crate::errors::ApiError;
use serde::de::DeserializeOwned;

// Builds the shared HTTP client used by every remote collaborator.
// Applies the optional request timeout from `Config`.
pub fn create_http_client(config: &Config) -> Result<reqwest::Client, ApiError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!("blog_forms/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = config.http_timeout {
        tracing::info!(timeout_secs = timeout.as_secs(), "Setting HTTP request timeout");
        builder = builder.timeout(timeout);
    } else {
        tracing::info!("Using transport default timeouts.");
    }

    Ok(builder.build()?)
}

/// Turns a non-success status into `ApiError::Status`, keeping the body as
/// the message.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), body = %message, "Remote service returned an error status");
    Err(ApiError::Status { status: status.as_u16(), message })
}

/// Checks the status and parses the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json()
        .await
        .map_err(|e| ApiError::Parse(format!("Failed to parse response: {}", e)))
}

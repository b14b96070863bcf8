use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

// --- Collaborator Errors ---

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request rejected by service: {0}")]
    Rejected(String),

    #[error("Could not parse response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay responded with status {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File not found with key: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error),
}

// --- Form Errors ---

/// A local input rule failed. The message is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a post title before generating images.")]
    EmptyTitle,
    #[error("Fill in the form correctly.")]
    FormConstraints,
    #[error("The post title must have at least {min} characters.")]
    TitleTooShort { min: usize },
    #[error("The author name must have at least {min} characters.")]
    AuthorTooShort { min: usize },
    #[error("The post text must have at least {min} characters.")]
    ContentTooShort { min: usize },
    #[error("Please generate and select a cover image for the post.")]
    NoCoverImage,
    #[error("The user name must have at least {min} characters.")]
    NameTooShort { min: usize },
    #[error("Enter a valid phone number with area code (format: (XX) XXXXX-XXXX).")]
    InvalidPhone,
    #[error("The password must have at least {min} characters.")]
    PasswordTooShort { min: usize },
    #[error("The password must contain at least one number.")]
    PasswordMissingDigit,
    #[error("The password must contain at least one letter.")]
    PasswordMissingLetter,
    #[error("The password must contain at least one special character.")]
    PasswordMissingSpecial,
    #[error("The passwords do not match.")]
    PasswordMismatch,
    #[error("This e-mail is already registered.")]
    DuplicateEmail,
}

/// A remote call failed or returned nothing usable.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Remote request failed")]
    Request(#[source] ApiError),
    #[error("No images were generated")]
    EmptyResult,
    #[error("Could not read the stored session")]
    Session(#[source] SessionError),
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("Interface error: {0}")]
    Integration(String),
    #[error("A submission is already in progress")]
    SubmissionInProgress,
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        ServiceError::Request(err)
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        ServiceError::Session(err)
    }
}

impl From<ApiError> for FormError {
    fn from(err: ApiError) -> Self {
        FormError::Service(err.into())
    }
}

impl From<SessionError> for FormError {
    fn from(err: SessionError) -> Self {
        FormError::Service(err.into())
    }
}

impl FormError {
    /// HTTP status the host answers with for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            FormError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FormError::Service(_) => StatusCode::BAD_GATEWAY,
            FormError::Integration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FormError::SubmissionInProgress => StatusCode::CONFLICT,
        }
    }
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("Page is not open: {0}")]
    PageNotOpen(&'static str),
    #[error("Could not perform file storage operation")]
    StorageError(#[source] StorageError),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::StorageError(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Form(err.into())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Form(err.into())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Form(FormError::Validation(e)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "warning": e.to_string() }),
            ),
            AppError::Form(e) => {
                tracing::error!(error.source = ?e, "Form operation failed");
                (e.status(), serde_json::json!({ "error": e.to_string() }))
            }
            AppError::PageNotOpen(page) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": format!("Open the {} page first", page) }),
            ),
            AppError::StorageError(StorageError::NotFound(key)) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": format!("File not found: {}", key) }),
            ),
            AppError::StorageError(e) => {
                tracing::error!(error.source = ?e, "Storage error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "File storage operation failed" }),
                )
            }
        };

        tracing::debug!(error.status = %status, error.detail = %self, "Responding with error");
        (status, Json(body)).into_response()
    }
}

use crate::errors::{ApiError, MailError, SessionError};
use crate::models::{
    AccountNotice, GenerateImagesRequest, GeneratedImage, NewPost, NewPostNotice, NewUser, Post, User,
};
use async_trait::async_trait;

/// Backend operations on users and posts.
#[async_trait]
pub trait BlogApi: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    async fn find_all_users(&self) -> Result<Vec<User>, ApiError>;

    /// Returns Ok(None) if the user does not exist.
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError>;

    async fn create_user(&self, user: &NewUser) -> Result<(), ApiError>;

    async fn find_all_posts(&self) -> Result<Vec<Post>, ApiError>;

    /// Creates a post. Returns the stored record when the backend echoes it.
    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>, ApiError>;
}

/// Remote AI image generation.
#[async_trait]
pub trait ImageService: Send + Sync + 'static {
    /// Requests candidates for a title. An empty list is a valid answer here;
    /// callers decide what it means.
    async fn generate(&self, request: &GenerateImagesRequest) -> Result<Vec<GeneratedImage>, ApiError>;
}

/// Outgoing notification emails. Delivery is not confirmed.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send_new_post(&self, notice: &NewPostNotice) -> Result<(), MailError>;

    async fn send_account_created(&self, notice: &AccountNotice) -> Result<(), MailError>;
}

/// The persisted session identifier of the local user.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn user_id(&self) -> Result<Option<String>, SessionError>;

    async fn store(&self, user_id: &str) -> Result<(), SessionError>;

    async fn clear(&self) -> Result<(), SessionError>;
}

use crate::{
    domain::BlogApi,
    errors::ApiError,
    http_client::{ensure_success, read_json},
    models::{NewPost, NewUser, Post, User},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{self, info};

// Backend routes, relative to BLOG_API_URL
const USERS_PATH: &str = "/api/usuarios";
const POSTS_PATH: &str = "/api/postagens";

/// `BlogApi` over the backend's REST routes.
#[derive(Debug, Clone)]
pub struct HttpBlogApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlogApi {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        info!(%base_url, "Initializing HttpBlogApi");
        Self { client, base_url }
    }

    // Base URL has no trailing slash, paths start with one
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn find_all_users(&self) -> Result<Vec<User>, ApiError> {
        tracing::debug!("Backend: Listing users");
        let response = self.client.get(self.url(USERS_PATH)).send().await?;
        // Status check and parse in one step
        let users: Vec<User> = read_json(response).await?;
        tracing::debug!("Backend: Listed {} users", users.len());
        Ok(users)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        tracing::debug!(user_id = %id, "Backend: Fetching user");
        let response = self
            .client
            .get(self.url(&format!("{}/{}", USERS_PATH, id)))
            .send()
            .await?;
        // Treat 404 as "not found" rather than an error
        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!(user_id = %id, "Backend: User not found");
            return Ok(None);
        }
        // Any other error status surfaces as ApiError::Status
        Ok(Some(read_json(response).await?))
    }

    async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        tracing::debug!(email = %user.email, "Backend: Creating user");
        // Body is sent with the backend's field names (nome, telefone, senha)
        let response = self.client.post(self.url(USERS_PATH)).json(user).send().await?;
        // The response body carries nothing we need
        ensure_success(response).await?;
        info!(email = %user.email, "Backend: User created");
        Ok(())
    }

    async fn find_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        tracing::debug!("Backend: Listing posts");
        let response = self.client.get(self.url(POSTS_PATH)).send().await?;
        let posts: Vec<Post> = read_json(response).await?;
        tracing::debug!("Backend: Listed {} posts", posts.len());
        Ok(posts)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>, ApiError> {
        tracing::debug!(title = %post.title, user_id = %post.user_id, "Backend: Creating post");
        let response = self.client.post(self.url(POSTS_PATH)).json(post).send().await?;
        let response = ensure_success(response).await?;

        // Read as text first so an empty or plain-text body is not an error

        // The body is informative only; an unparseable echo is not a failure.
        let body = response.text().await?;
        let created = match serde_json::from_str::<Post>(&body) {
            Ok(created) => Some(created),
            Err(e) => {
                tracing::debug!(error = %e, "Backend: Create-post response carried no post record");
                None
            }
        };
        info!(title = %post.title, echoed = created.is_some(), "Backend: Post created");
        Ok(created)
    }
}

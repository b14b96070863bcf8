//! In-memory collaborators for unit tests.

use crate::{
    domain::{BlogApi, ImageService, Mailer, SessionStore},
    errors::{ApiError, MailError, SessionError},
    models::{
        AccountNotice, GenerateImagesRequest, GeneratedImage, NewPost, NewPostNotice, NewUser, Post, RecordId,
        User,
    },
};
use async_trait::async_trait;
use std::{collections::VecDeque, sync::Mutex};
use tokio::sync::Notify;

pub fn user(id: i64, name: &str, email: &str) -> User {
    User {
        id: Some(RecordId::Number(id)),
        name: name.to_string(),
        phone: "(31) 99999-8888".to_string(),
        email: email.to_string(),
        password_hash: String::new(),
    }
}

#[derive(Default)]
pub struct FakeBlogApi {
    pub users: Mutex<Vec<User>>,
    pub posts: Mutex<Vec<Post>>,
    pub created_users: Mutex<Vec<NewUser>>,
    pub created_posts: Mutex<Vec<NewPost>>,
    /// Whether `create_post` echoes the stored record with an id.
    pub echo_created_post: bool,
    pub fail_listing: bool,
}

impl FakeBlogApi {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            message: "backend down".to_string(),
        }
    }
}

#[async_trait]
impl BlogApi for FakeBlogApi {
    async fn find_all_users(&self) -> Result<Vec<User>, ApiError> {
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id.as_ref().is_some_and(|uid| uid.to_string() == id))
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        self.created_users.lock().unwrap().push(user.clone());
        Ok(())
    }

    async fn find_all_posts(&self) -> Result<Vec<Post>, ApiError> {
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        Ok(self.posts.lock().unwrap().clone())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Option<Post>, ApiError> {
        self.created_posts.lock().unwrap().push(post.clone());
        let mut posts = self.posts.lock().unwrap();
        let stored = Post {
            id: Some(RecordId::Text(format!("post-{}", posts.len() + 1))),
            title: post.title.clone(),
            author: post.author.clone(),
            content: post.content.clone(),
            image_link: post.image_link.clone(),
            user_id: Some(RecordId::Text(post.user_id.clone())),
        };
        posts.push(stored.clone());
        Ok(self.echo_created_post.then_some(stored))
    }
}

/// What the fake image service answers with next.
pub enum Scripted {
    Images(Vec<GeneratedImage>),
    Fail(ApiError),
}

#[derive(Default)]
pub struct FakeImageService {
    pub requests: Mutex<Vec<GenerateImagesRequest>>,
    pub script: Mutex<VecDeque<Scripted>>,
}

impl FakeImageService {
    pub fn answering(answers: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageService for FakeImageService {
    async fn generate(&self, request: &GenerateImagesRequest) -> Result<Vec<GeneratedImage>, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Images(images)) => Ok(images),
            Some(Scripted::Fail(err)) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

/// Image service that answers only after `release` is notified.
#[derive(Default)]
pub struct HeldImageService {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl ImageService for HeldImageService {
    async fn generate(&self, _request: &GenerateImagesRequest) -> Result<Vec<GeneratedImage>, ApiError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(urls(&["https://img.test/late.png"]))
    }
}

pub fn urls(urls: &[&str]) -> Vec<GeneratedImage> {
    urls.iter().map(|u| GeneratedImage::Url(u.to_string())).collect()
}

pub fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "boom".to_string(),
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub new_posts: Mutex<Vec<NewPostNotice>>,
    pub accounts: Mutex<Vec<AccountNotice>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_new_post(&self, notice: &NewPostNotice) -> Result<(), MailError> {
        self.new_posts.lock().unwrap().push(notice.clone());
        Ok(())
    }

    async fn send_account_created(&self, notice: &AccountNotice) -> Result<(), MailError> {
        self.accounts.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    pub user_id: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            user_id: Mutex::new(Some(user_id.to_string())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn user_id(&self) -> Result<Option<String>, SessionError> {
        Ok(self.user_id.lock().unwrap().clone())
    }

    async fn store(&self, user_id: &str) -> Result<(), SessionError> {
        *self.user_id.lock().unwrap() = Some(user_id.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        *self.user_id.lock().unwrap() = None;
        Ok(())
    }
}

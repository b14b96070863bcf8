//! Page controllers for the blog front end: registration, post creation and
//! AI cover-image generation, plus a small JSON host that drives them.

pub mod config;
pub mod domain;
pub mod errors;
pub mod form;
pub mod handlers;
pub mod http_client;
pub mod image_generator;
pub mod image_service;
pub mod mailer;
pub mod models;
pub mod navigation;
pub mod post_form;
pub mod registration;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod startup;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    config::Config,
    domain::{BlogApi, Mailer, SessionStore},
    image_generator::ImageGenerator,
    post_form::PostForm,
    registration::RegistrationForm,
    storage::LocalAssets,
};

/// AppState holds the collaborators and the currently open pages of the
/// single local user.
pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn BlogApi>,
    pub mailer: Arc<dyn Mailer>,
    pub session: Arc<dyn SessionStore>,
    pub assets: LocalAssets,
    pub generator: Arc<ImageGenerator>,
    pub post_page: RwLock<Option<Arc<PostForm>>>,
    pub registration_page: Mutex<Option<RegistrationForm>>,
}

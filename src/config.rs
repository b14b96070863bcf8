use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

use crate::navigation::Page;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

/// Endpoint and template ids for the EmailJS-style mail relay.
#[derive(Clone, Debug)]
pub struct MailConfig {
    pub endpoint: String,
    pub service_id: String,
    pub user_id: String,
    pub new_post_template: String,
    pub new_account_template: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub blog_api_url: String,
    pub image_api_url: String,
    pub image_count: u32,
    pub image_slots: usize,
    pub fallback_images: Vec<String>,
    pub fallback_dir: PathBuf,
    pub placeholder_url_template: String,
    pub session_dir: PathBuf,
    /// `None` means notifications are only logged.
    pub mail: Option<MailConfig>,
    pub http_timeout: Option<Duration>,
    pub login_page: String,
    pub edit_account_page: String,
    pub post_listing_page: String,
}

pub const DEFAULT_FALLBACK_IMAGES: [&str; 4] = [
    "/assets/images/fallback/image1.jpg",
    "/assets/images/fallback/image2.jpg",
    "/assets/images/fallback/image3.jpg",
    "/assets/images/fallback/image4.jpg",
];

pub const DEFAULT_PLACEHOLDER_TEMPLATE: &str =
    "https://via.placeholder.com/800x600?text=Imagem+{n}";

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address_str = var("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_address = SocketAddr::from_str(&bind_address_str)
            .map_err(|e| ConfigError::InvalidVar("BIND_ADDRESS".into(), e.to_string()))?;

        let blog_api_url = trim_url(var("BLOG_API_URL").unwrap_or_else(|| "http://localhost:8080".to_string()));
        let image_api_url = var("IMAGE_API_URL").map(trim_url).unwrap_or_else(|| blog_api_url.clone());

        let image_count = parse_var(&var, "IMAGE_COUNT", 4u32)?;
        let image_slots = parse_var(&var, "IMAGE_SLOTS", 4usize)?;

        let fallback_images: Vec<String> = match var("FALLBACK_IMAGES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_FALLBACK_IMAGES.iter().map(|s| s.to_string()).collect(),
        };
        // A failed generation with nothing to fall back on would show no images at all.
        if fallback_images.is_empty() {
            return Err(ConfigError::InvalidVar(
                "FALLBACK_IMAGES".into(),
                "at least one image path is required".into(),
            ));
        }

        let fallback_dir = PathBuf::from(var("FALLBACK_DIR").unwrap_or_else(|| "assets/images/fallback".to_string()));
        let placeholder_url_template =
            var("PLACEHOLDER_URL_TEMPLATE").unwrap_or_else(|| DEFAULT_PLACEHOLDER_TEMPLATE.to_string());
        let session_dir = PathBuf::from(var("SESSION_DIR").unwrap_or_else(|| ".blog_forms".to_string()));

        let mail = match var("MAIL_API_URL") {
            Some(endpoint) => Some(MailConfig {
                endpoint,
                service_id: var("MAIL_SERVICE_ID")
                    .ok_or_else(|| ConfigError::MissingVar("MAIL_SERVICE_ID".into()))?,
                user_id: var("MAIL_USER_ID").ok_or_else(|| ConfigError::MissingVar("MAIL_USER_ID".into()))?,
                new_post_template: var("MAIL_TEMPLATE_NEW_POST").unwrap_or_else(|| "new_post".to_string()),
                new_account_template: var("MAIL_TEMPLATE_NEW_ACCOUNT").unwrap_or_else(|| "new_account".to_string()),
            }),
            None => None,
        };

        let http_timeout = match var("BLOG_HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidVar("BLOG_HTTP_TIMEOUT_SECS".into(), e.to_string()))?,
            )),
            None => None,
        };

        Ok(Config {
            bind_address,
            blog_api_url,
            image_api_url,
            image_count,
            image_slots,
            fallback_images,
            fallback_dir,
            placeholder_url_template,
            session_dir,
            mail,
            http_timeout,
            login_page: var("LOGIN_PAGE").unwrap_or_else(|| "/usuario/login.html".to_string()),
            edit_account_page: var("EDIT_ACCOUNT_PAGE")
                .unwrap_or_else(|| "/usuario/editar-informacoes.html".to_string()),
            post_listing_page: var("POST_LISTING_PAGE").unwrap_or_else(|| "/postagens/postagens.html".to_string()),
        })
    }

    /// Where a navigation to `page` should land.
    pub fn page_url(&self, page: Page) -> &str {
        match page {
            Page::Login => &self.login_page,
            Page::EditAccount => &self.edit_account_page,
            Page::PostListing => &self.post_listing_page,
        }
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_var<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-assigned identifier. The backend has served both numeric and
/// string ids, so either is accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(default, alias = "senha", skip_serializing)]
    pub password_hash: String,
}

/// Create payload for a user, in the field names the backend expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password_hash: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(alias = "conteudo")]
    pub content: String,
    #[serde(default, alias = "imagemUrl")]
    pub image_link: String,
    #[serde(default, alias = "autorId")]
    pub user_id: Option<RecordId>,
}

impl Post {
    /// True when this post was written by `user_id`.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_ref().is_some_and(|id| id.to_string() == user_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub author: String,
    pub content: String,
    pub image_link: String,
    pub user_id: String,
}

/// One candidate returned by the image service: either a bare URL or an
/// object carrying one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum GeneratedImage {
    Url(String),
    Object { url: String },
}

impl GeneratedImage {
    pub fn url(&self) -> &str {
        match self {
            GeneratedImage::Url(url) => url,
            GeneratedImage::Object { url } => url,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GenerateImagesRequest {
    pub title: String,
    pub count: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerateImagesResponse {
    pub success: bool,
    #[serde(default)]
    pub images: Vec<GeneratedImage>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload consumed by the post form when a cover image is picked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSelected {
    pub image_url: String,
}

/// Arguments of the "new post" email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPostNotice {
    pub recipient_email: String,
    pub recipient_name: String,
    pub post_id: String,
    pub post_title: String,
    pub post_author: String,
}

/// Arguments of the "account created" email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNotice {
    pub email: String,
    pub name: String,
    pub phone: String,
}

//! Notification emails through an EmailJS-style relay.
//!
//! The relay takes `{service_id, template_id, user_id, template_params}` and
//! renders the message itself. Without a relay configured, notices are only
//! logged.

use crate::{
    config::MailConfig,
    domain::Mailer,
    errors::MailError,
    models::{AccountNotice, NewPostNotice},
};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Serialize, Debug)]
struct RelayRequest<'a, P: Serialize> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: P,
}

#[derive(Serialize, Debug)]
struct NewPostParams<'a> {
    to_email: &'a str,
    to_name: &'a str,
    post_id: &'a str,
    post_title: &'a str,
    post_author: &'a str,
}

#[derive(Serialize, Debug)]
struct AccountParams<'a> {
    to_email: &'a str,
    to_name: &'a str,
    phone: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, config: MailConfig) -> Self {
        Self { client, config }
    }

    async fn send<P: Serialize + Send + Sync>(&self, template_id: &str, params: P) -> Result<(), MailError> {
        let request = RelayRequest {
            service_id: &self.config.service_id,
            template_id,
            user_id: &self.config.user_id,
            template_params: params,
        };
        let response = self.client.post(&self.config.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Status { status: status.as_u16(), message });
        }
        tracing::debug!(template_id, "Mail relay accepted message");
        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_new_post(&self, notice: &NewPostNotice) -> Result<(), MailError> {
        let params = NewPostParams {
            to_email: &notice.recipient_email,
            to_name: &notice.recipient_name,
            post_id: &notice.post_id,
            post_title: &notice.post_title,
            post_author: &notice.post_author,
        };
        self.send(&self.config.new_post_template, params).await
    }

    async fn send_account_created(&self, notice: &AccountNotice) -> Result<(), MailError> {
        let params = AccountParams {
            to_email: &notice.email,
            to_name: &notice.name,
            phone: &notice.phone,
        };
        self.send(&self.config.new_account_template, params).await
    }
}

/// Mailer used when no relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_new_post(&self, notice: &NewPostNotice) -> Result<(), MailError> {
        tracing::info!(
            to = %notice.recipient_email,
            post_id = %notice.post_id,
            post_title = %notice.post_title,
            "Mail relay not configured; new-post notice not sent"
        );
        Ok(())
    }

    async fn send_account_created(&self, notice: &AccountNotice) -> Result<(), MailError> {
        tracing::info!(to = %notice.email, "Mail relay not configured; account notice not sent");
        Ok(())
    }
}

use crate::{
    domain::{BlogApi, Mailer, SessionStore},
    errors::{FormError, ValidationError},
    form::{all_present, is_email_shaped, matches_mask, trimmed_len},
    models::{AccountNotice, NewUser},
    navigation::{Gate, Page},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const MIN_NAME_LEN: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const PHONE_MASK: &str = "(XX) XXXXX-XXXX";
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug)]
pub struct Registered {
    pub email: String,
    /// The account-creation email; dropping it detaches the task.
    pub notification: JoinHandle<()>,
}

pub struct RegistrationForm {
    api: Arc<dyn BlogApi>,
    mailer: Arc<dyn Mailer>,
    /// Emails known when the page opened, plus the ones registered since.
    known_emails: Vec<String>,
}

/// Lowercase hex SHA-256 of the password.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl RegistrationForm {
    /// Opens the signup page. A user who already has a session is sent to
    /// the account page instead.
    pub async fn open(
        session: &dyn SessionStore,
        api: Arc<dyn BlogApi>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Gate<Self>, FormError> {
        if let Some(user_id) = session.user_id().await? {
            tracing::info!(%user_id, "Already signed in, redirecting to account page");
            return Ok(Gate::Redirect(Page::EditAccount));
        }

        let users = api.find_all_users().await?;
        tracing::info!(known_users = users.len(), "Registration page opened");
        Ok(Gate::Open(Self {
            api,
            mailer,
            known_emails: users.into_iter().map(|u| u.email).collect(),
        }))
    }

    /// Exact match against the snapshot; case matters.
    fn email_taken(&self, email: &str) -> bool {
        let email = email.trim();
        self.known_emails.iter().any(|known| known == email)
    }

    /// Checks the draft; the first failing rule wins.
    pub fn validate(&self, draft: &RegistrationDraft) -> Result<(), ValidationError> {
        let RegistrationDraft {
            name,
            phone,
            email,
            password,
            confirm_password,
        } = draft;

        let fields = [
            name.as_str(),
            phone.as_str(),
            email.as_str(),
            password.as_str(),
            confirm_password.as_str(),
        ];
        if !all_present(&fields) || !is_email_shaped(email) {
            return Err(ValidationError::FormConstraints);
        }
        if trimmed_len(name) < MIN_NAME_LEN {
            return Err(ValidationError::NameTooShort { min: MIN_NAME_LEN });
        }
        if !matches_mask(phone, PHONE_MASK) {
            return Err(ValidationError::InvalidPhone);
        }
        if trimmed_len(password) < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordMissingDigit);
        }
        if !password.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::PasswordMissingLetter);
        }
        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(ValidationError::PasswordMissingSpecial);
        }
        if password != confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if self.email_taken(email) {
            return Err(ValidationError::DuplicateEmail);
        }
        Ok(())
    }

    /// Validates, submits the user and resets the draft.
    pub async fn submit(&mut self, draft: &mut RegistrationDraft) -> Result<Registered, FormError> {
        self.validate(draft)?;

        let user = NewUser {
            name: draft.name.trim().to_string(),
            phone: draft.phone.clone(),
            email: draft.email.trim().to_string(),
            password_hash: hash_password(&draft.password),
        };
        self.api.create_user(&user).await?;

        *draft = RegistrationDraft::default();
        self.known_emails.push(user.email.clone());
        tracing::info!(email = %user.email, "User registered");

        let mailer = self.mailer.clone();
        let notice = AccountNotice {
            email: user.email.clone(),
            name: user.name,
            phone: user.phone,
        };
        let notification = tokio::spawn(async move {
            if let Err(e) = mailer.send_account_created(&notice).await {
                tracing::warn!(to = %notice.email, error = %e, "Account notification failed");
            }
        });

        Ok(Registered {
            email: user.email,
            notification,
        })
    }
}

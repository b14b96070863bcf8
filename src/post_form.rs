use crate::{
    domain::{BlogApi, Mailer, SessionStore},
    errors::{FormError, ValidationError},
    form::{all_present, trimmed_len},
    models::{ImageSelected, NewPost, NewPostNotice, Post},
    navigation::{Gate, Navigation, Page},
};
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::watch, task::JoinHandle};

pub const MIN_TITLE_LEN: usize = 5;
pub const MIN_AUTHOR_LEN: usize = 10;
pub const MIN_CONTENT_LEN: usize = 100;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub content: String,
}

/// A post that reached the backend. `notifications` finishes once every
/// subscriber email has been attempted; dropping it detaches the task.
#[derive(Debug)]
pub struct PostSubmission {
    pub navigation: Navigation,
    pub notifications: JoinHandle<()>,
}

pub struct PostForm {
    api: Arc<dyn BlogApi>,
    mailer: Arc<dyn Mailer>,
    selection: watch::Receiver<Option<ImageSelected>>,
    user_id: String,
    author_name: Option<String>,
    submitting: AtomicBool,
}

/// Re-enables the submit control when dropped.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PostForm {
    /// Opens the post page. Without a stored session the page is never shown.
    pub async fn open(
        session: &dyn SessionStore,
        api: Arc<dyn BlogApi>,
        mailer: Arc<dyn Mailer>,
        selection: watch::Receiver<Option<ImageSelected>>,
    ) -> Gate<Self> {
        let user_id = match session.user_id().await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                tracing::info!("Post page requires a session, redirecting to login");
                return Gate::Redirect(Page::Login);
            }
            Err(e) => {
                tracing::error!(error = %e, "Could not read session, redirecting to login");
                return Gate::Redirect(Page::Login);
            }
        };

        let author_name = match api.find_user_by_id(&user_id).await {
            Ok(Some(user)) => Some(user.name),
            Ok(None) => {
                tracing::warn!(%user_id, "Session user not found, author left empty");
                None
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Author lookup failed, author left empty");
                None
            }
        };

        tracing::info!(%user_id, "Post page opened");
        Gate::Open(Self {
            api,
            mailer,
            selection,
            user_id,
            author_name,
            submitting: AtomicBool::new(false),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// An empty draft with the author pre-filled from the session user.
    pub fn draft(&self) -> PostDraft {
        PostDraft {
            author: self.author_name.clone().unwrap_or_default(),
            ..PostDraft::default()
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    fn selected_image_url(&self) -> Option<String> {
        self.selection
            .borrow()
            .as_ref()
            .map(|selected| selected.image_url.clone())
            .filter(|url| !url.trim().is_empty())
    }

    /// Checks the draft; the first failing rule wins.
    pub fn validate(&self, draft: &PostDraft) -> Result<NewPost, ValidationError> {
        if !all_present(&[draft.title.as_str(), draft.author.as_str(), draft.content.as_str()]) {
            return Err(ValidationError::FormConstraints);
        }
        if trimmed_len(&draft.title) < MIN_TITLE_LEN {
            return Err(ValidationError::TitleTooShort { min: MIN_TITLE_LEN });
        }
        if trimmed_len(&draft.author) < MIN_AUTHOR_LEN {
            return Err(ValidationError::AuthorTooShort { min: MIN_AUTHOR_LEN });
        }
        if trimmed_len(&draft.content) < MIN_CONTENT_LEN {
            return Err(ValidationError::ContentTooShort { min: MIN_CONTENT_LEN });
        }
        let image_link = self.selected_image_url().ok_or(ValidationError::NoCoverImage)?;

        Ok(NewPost {
            title: draft.title.trim().to_string(),
            author: draft.author.trim().to_string(),
            content: draft.content.trim().to_string(),
            image_link,
            user_id: self.user_id.clone(),
        })
    }

    pub async fn submit(&self, draft: &PostDraft) -> Result<PostSubmission, FormError> {
        let post = self.validate(draft)?;

        if self.submitting.swap(true, Ordering::SeqCst) {
            tracing::warn!(user_id = %self.user_id, "Submit ignored, a submission is in progress");
            return Err(FormError::SubmissionInProgress);
        }
        let guard = SubmitGuard(&self.submitting);

        tracing::debug!(title = %post.title, image_link = %post.image_link, "Submitting post");
        let created = self.api.create_post(&post).await;
        drop(guard);
        let created = created?;

        tracing::info!(title = %post.title, user_id = %self.user_id, "Post created");
        let notifications = tokio::spawn(notify_subscribers(
            self.api.clone(),
            self.mailer.clone(),
            post,
            created,
        ));

        Ok(PostSubmission {
            navigation: Navigation::To(Page::PostListing),
            notifications,
        })
    }
}

/// Emails every user about a new post. Best effort: failures are logged and
/// never reach the author.
pub async fn notify_subscribers(api: Arc<dyn BlogApi>, mailer: Arc<dyn Mailer>, post: NewPost, created: Option<Post>) {
    let users = match api.find_all_users().await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(error = %e, "Could not list users for new-post notification");
            return;
        }
    };

    let stored = match created.filter(|p| p.id.is_some()) {
        Some(stored) => stored,
        None => {
            let posts = match api.find_all_posts().await {
                Ok(posts) => posts,
                Err(e) => {
                    tracing::error!(error = %e, "Could not list posts for new-post notification");
                    return;
                }
            };
            match correlate(&posts, &post) {
                Some(found) => found.clone(),
                None => {
                    tracing::warn!(title = %post.title, "Created post not found in listing, no notification sent");
                    return;
                }
            }
        }
    };

    let post_id = stored.id.as_ref().map(ToString::to_string).unwrap_or_default();
    for user in &users {
        let notice = NewPostNotice {
            recipient_email: user.email.clone(),
            recipient_name: user.name.clone(),
            post_id: post_id.clone(),
            post_title: stored.title.clone(),
            post_author: stored.author.clone(),
        };
        if let Err(e) = mailer.send_new_post(&notice).await {
            tracing::warn!(to = %user.email, error = %e, "New-post notification failed");
        }
    }
    tracing::info!(%post_id, recipients = users.len(), "New-post notifications sent");
}

/// Finds the just-created post by title, content and owner. Several matches
/// are possible; the first one in listing order is taken.
fn correlate<'a>(posts: &'a [Post], post: &NewPost) -> Option<&'a Post> {
    let mut matches = posts
        .iter()
        .filter(|p| p.title == post.title && p.content == post.content && p.is_owned_by(&post.user_id));
    let found = matches.next();
    let extra = matches.count();
    if extra > 0 {
        tracing::warn!(title = %post.title, candidates = extra + 1, "Several posts match the new post, using the first");
    }
    found
}

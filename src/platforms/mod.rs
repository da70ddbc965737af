use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Mention, Submission};

pub mod reddit;

/// Faults raised by the platform collaborator during loop operation.
///
/// Server-side and client-side faults are distinguished for observability
/// only; both abandon the current mention and the loop continues.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("server error (HTTP {status})")]
    Server { status: u16 },
    #[error("client error (HTTP {status}): {body}")]
    Client { status: u16, body: String },
    #[error("the platform rejected the request: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl PlatformError {
    /// Server-side faults are usually transient; anything else points at a
    /// fault on our end.
    pub fn is_server_side(&self) -> bool {
        matches!(
            self,
            PlatformError::Server { .. } | PlatformError::Network(_)
        )
    }
}

/// Trait defining the narrow capability set the mention loop needs from the
/// platform. Tests substitute a mock; production uses [`reddit::RedditConnection`].
#[async_trait]
pub trait PlatformConnection: Send + Sync {
    /// Exchange the configured credentials for a session and return the
    /// logged-in username.
    async fn authenticate(&mut self) -> Result<String, PlatformError>;

    /// Fetch mentions that arrived since the previous poll, oldest first.
    async fn poll_mentions(&mut self) -> Result<Vec<Mention>, PlatformError>;

    /// Fetch a submission's author and complete top-level comment set, with
    /// all collapsed placeholder nodes resolved.
    async fn fetch_submission(&self, submission_id: &str) -> Result<Submission, PlatformError>;

    /// Moderator usernames of the given subreddit.
    async fn community_moderators(&self, subreddit: &str) -> Result<Vec<String>, PlatformError>;

    /// Post a text reply under the triggering mention comment.
    async fn post_reply(&self, mention: &Mention, body: &str) -> Result<(), PlatformError>;

    /// Platform identifier (e.g., "reddit").
    fn platform_name(&self) -> &str;
}

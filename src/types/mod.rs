// src/types/mod.rs - Core data types that flow through the bot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal flag a requester embeds in the mention body to exclude the
/// submission author's own comments from the rating set.
pub const IGNORE_OP_FLAG: &str = "--ignore-op";

/// A username mention pulled from the bot's inbox.
///
/// Immutable once received; processed and discarded within one pass of the
/// mention loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Comment id of the mention itself (no kind prefix).
    pub id: String,
    /// Username of the requester.
    pub author: String,
    /// Subreddit the mention was posted in.
    pub subreddit: String,
    /// Id of the submission the mention is attached to.
    pub submission_id: String,
    /// Body text of the mention comment.
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl Mention {
    /// Whether the requester asked for the submission author's comments to
    /// be skipped during rating extraction.
    pub fn wants_op_skipped(&self) -> bool {
        self.body.contains(IGNORE_OP_FLAG)
    }
}

/// A single top-level comment on a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    /// `None` when the author account was deleted.
    pub author: Option<String>,
    pub body: String,
}

/// A submission with its full top-level comment set.
///
/// The platform layer resolves every collapsed placeholder node before
/// constructing this, so `comments` is never a partial view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    /// `None` when the author account was deleted.
    pub author: Option<String>,
    pub comments: Vec<Comment>,
}

/// Read-only aggregate computed over one request's retained ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub count: usize,
    pub mean: f64,
    /// Most frequent rating. Ties resolve to the smallest tied value.
    pub mode: f64,
    pub median: f64,
    /// Sample standard deviation (N-1 denominator).
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

/// Faults local to the aggregation path. Never escapes the mention loop;
/// callers substitute the fixed "no ratings found" reply instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("no ratings to aggregate")]
    EmptyInput,
    #[error("{what} needs at least {needed} ratings, got {got}")]
    InsufficientData {
        what: &'static str,
        needed: usize,
        got: usize,
    },
}

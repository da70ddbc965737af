use anyhow::Result;
use log::{debug, error, info};
use std::collections::VecDeque;
use tokio::time::{sleep, Duration};

use crate::config::BotConfiguration;
use crate::platforms::{PlatformConnection, PlatformError};
use crate::types::{Mention, Submission, SummaryRecord};

pub mod moderation;
pub mod ratings;
pub mod response;
pub mod stats;

/// One position of the mention loop. The loop has no terminal state; every
/// path leads back to [`LoopState::Idle`].
#[derive(Debug)]
pub enum LoopState {
    /// Waiting for the next mention.
    Idle,
    /// A mention arrived and is about to be logged and vetted.
    EventReceived(Mention),
    /// Checking the requester against the configured moderator sets.
    Authorizing(Mention),
    /// Pulling the referenced submission and its top-level comments.
    Fetching(Mention),
    /// Extracting ratings and building the reply body.
    Aggregating(Mention, Submission),
    /// Posting the reply under the triggering mention.
    Replying(Mention, String),
    /// A fault was logged; the next step resumes at Idle.
    ErrorRecovery(String),
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            LoopState::Idle => "Idle",
            LoopState::EventReceived(_) => "EventReceived",
            LoopState::Authorizing(_) => "Authorizing",
            LoopState::Fetching(_) => "Fetching",
            LoopState::Aggregating(_, _) => "Aggregating",
            LoopState::Replying(_, _) => "Replying",
            LoopState::ErrorRecovery(_) => "ErrorRecovery",
        }
    }
}

/// The long-running control flow: consumes mentions one at a time, checks
/// authorization, aggregates ratings, and posts the reply.
pub struct MentionBot {
    platform: Box<dyn PlatformConnection>,
    config: BotConfiguration,
    pending: VecDeque<Mention>,
    /// False until the first poll; that poll's batch is discarded so the bot
    /// never answers mentions that predate this run.
    primed: bool,
}

impl MentionBot {
    pub fn new(platform: Box<dyn PlatformConnection>, config: BotConfiguration) -> Self {
        Self {
            platform,
            config,
            pending: VecDeque::new(),
            primed: false,
        }
    }

    /// Drive the state machine until the process is stopped externally.
    /// No per-mention fault can break out of this loop.
    pub async fn run(&mut self) {
        info!(
            "Mention loop started on {} for {} subreddit(s)",
            self.platform.platform_name(),
            self.config.subreddits.len()
        );
        let mut state = LoopState::Idle;
        loop {
            state = self.step(state).await;
            if matches!(state, LoopState::Idle) && self.pending.is_empty() {
                sleep(Duration::from_secs(self.config.poll_interval_seconds)).await;
            }
        }
    }

    /// Perform exactly one state transition. Any fault becomes
    /// [`LoopState::ErrorRecovery`] instead of propagating.
    pub async fn step(&mut self, state: LoopState) -> LoopState {
        let from = state.name();
        let next = match self.advance(state).await {
            Ok(next) => next,
            Err(err) => {
                match err.downcast_ref::<PlatformError>() {
                    Some(upstream) if upstream.is_server_side() => error!(
                        "Platform error: {upstream}. Server-side faults are usually transient; \
                         abandoning the current mention."
                    ),
                    Some(upstream) => error!(
                        "Platform error: {upstream}. Client-side faults usually mean a bug on \
                         our end; abandoning the current mention."
                    ),
                    None => error!("Unexpected error while processing a mention: {err:#}"),
                }
                LoopState::ErrorRecovery(format!("{err:#}"))
            }
        };
        debug!("Loop transition: {} -> {}", from, next.name());
        next
    }

    async fn advance(&mut self, state: LoopState) -> Result<LoopState> {
        match state {
            LoopState::Idle => {
                if let Some(mention) = self.pending.pop_front() {
                    return Ok(LoopState::EventReceived(mention));
                }
                let batch = self.platform.poll_mentions().await?;
                if !self.primed {
                    // The inbox is an at-least-once feed and may replay items
                    // from before this run attached.
                    self.primed = true;
                    if !batch.is_empty() {
                        info!("Discarding {} mention(s) that predate this run", batch.len());
                    }
                    return Ok(LoopState::Idle);
                }
                self.pending.extend(batch);
                Ok(match self.pending.pop_front() {
                    Some(mention) => LoopState::EventReceived(mention),
                    None => LoopState::Idle,
                })
            }

            LoopState::EventReceived(mention) => {
                info!(
                    "Bot mentioned by u/{} in comment {} and subreddit r/{}",
                    mention.author, mention.id, mention.subreddit
                );
                Ok(LoopState::Authorizing(mention))
            }

            LoopState::Authorizing(mention) => {
                if !self.config.monitors_subreddit(&mention.subreddit) {
                    debug!(
                        "Dropping mention {}: r/{} is not monitored",
                        mention.id, mention.subreddit
                    );
                    return Ok(LoopState::Idle);
                }
                let authorized = moderation::is_moderator(
                    self.platform.as_ref(),
                    &mention.author,
                    &self.config.subreddits,
                )
                .await?;
                if authorized {
                    Ok(LoopState::Fetching(mention))
                } else {
                    // Unauthorized requesters get no reply at all.
                    debug!(
                        "Dropping mention {}: u/{} is not a moderator",
                        mention.id, mention.author
                    );
                    Ok(LoopState::Idle)
                }
            }

            LoopState::Fetching(mention) => {
                let submission = self.platform.fetch_submission(&mention.submission_id).await?;
                Ok(LoopState::Aggregating(mention, submission))
            }

            LoopState::Aggregating(mention, submission) => {
                let ratings = collect_ratings(&submission, mention.wants_op_skipped());
                let body = match SummaryRecord::from_ratings(&ratings) {
                    Ok(summary) => response::render_summary(&self.config.comment, &summary),
                    Err(reason) => {
                        info!(
                            "Submission {}: {}; using the fallback reply",
                            submission.id, reason
                        );
                        response::no_ratings_reply()
                    }
                };
                Ok(LoopState::Replying(mention, body))
            }

            LoopState::Replying(mention, body) => {
                self.platform.post_reply(&mention, &body).await?;
                Ok(LoopState::Idle)
            }

            LoopState::ErrorRecovery(_) => Ok(LoopState::Idle),
        }
    }
}

/// Run the rating parser over every top-level comment, optionally skipping
/// the submission author's own comments.
fn collect_ratings(submission: &Submission, skip_op: bool) -> Vec<f64> {
    let mut all_ratings = Vec::new();
    for comment in &submission.comments {
        if skip_op && is_op(comment.author.as_deref(), submission.author.as_deref()) {
            debug!("Skipping comment {} by the submission author", comment.id);
            continue;
        }
        if let Some(rating) = ratings::extract_rating(&comment.body) {
            let preview: String = comment.body.chars().filter(|c| *c != '\n').take(10).collect();
            info!("Comment \"{preview}...\" -> rating {rating:.2}");
            all_ratings.push(rating);
        }
    }
    all_ratings
}

fn is_op(comment_author: Option<&str>, submission_author: Option<&str>) -> bool {
    match (comment_author, submission_author) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        // Deleted accounts are indistinguishable; keep their ratings.
        _ => false,
    }
}

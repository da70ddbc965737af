//! Requester authorization against the configured subreddits' moderator sets.

use log::debug;

use crate::platforms::{PlatformConnection, PlatformError};

/// True iff `author` moderates at least one of the listed subreddits.
///
/// Every subreddit is checked until a match is found; a non-moderator result
/// on an early entry never concludes the check. Username comparison is
/// case-insensitive, matching Reddit's handling of usernames.
pub async fn is_moderator(
    platform: &dyn PlatformConnection,
    author: &str,
    subreddits: &[String],
) -> Result<bool, PlatformError> {
    for subreddit in subreddits {
        let moderators = platform.community_moderators(subreddit).await?;
        if moderators
            .iter()
            .any(|name| name.eq_ignore_ascii_case(author))
        {
            debug!("u/{} moderates r/{}", author, subreddit);
            return Ok(true);
        }
    }
    debug!("u/{} moderates none of the configured subreddits", author);
    Ok(false)
}

//! Rendering of the outbound reply from the configured template.

use crate::types::SummaryRecord;

/// Attribution footer appended to every outbound reply.
pub const FOOTER: &str = "\n\n^(This action was performed by a bot. Message the subreddit moderators with any questions.)";

/// Fixed reply body used when no ratings could be extracted.
pub const NO_RATINGS_MESSAGE: &str =
    "No ratings were found in the top-level comments of that submission.";

/// Substitute each recognized placeholder with its value formatted to two
/// decimal places. Unrecognized placeholders are left untouched.
pub fn render_summary(template: &str, summary: &SummaryRecord) -> String {
    let substitutions = [
        (":num_ratings:", summary.count as f64),
        (":mean:", summary.mean),
        (":mode:", summary.mode),
        (":median:", summary.median),
        (":stdev:", summary.stdev),
        (":max:", summary.max),
        (":min:", summary.min),
    ];

    let mut response = template.to_string();
    for (token, value) in substitutions {
        response = response.replace(token, &format!("{value:.2}"));
    }
    response.push_str(FOOTER);
    response
}

/// The fallback reply for requests that yielded no usable ratings.
pub fn no_ratings_reply() -> String {
    format!("{NO_RATINGS_MESSAGE}{FOOTER}")
}

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::RedditCredentials;
use crate::platforms::{PlatformConnection, PlatformError};
use crate::types::{Comment, Mention, Submission};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

/// Refresh the access token this many seconds before it actually expires.
const TOKEN_SLACK_SECONDS: i64 = 60;

/// One `/api/morechildren` call resolves at most this many placeholder ids.
const MORECHILDREN_BATCH: usize = 100;

/// Configuration for the Reddit script-app connection.
#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl RedditConfig {
    pub fn new(credentials: &RedditCredentials) -> Self {
        // Reddit asks for a descriptive, unique user agent.
        let user_agent = format!(
            "{}:ratestats:v{} (by /u/{})",
            std::env::consts::OS,
            crate::VERSION,
            credentials.username
        );
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            user_agent,
        }
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_SLACK_SECONDS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

/// Reddit OAuth2 connection implementation (script-app password grant).
pub struct RedditConnection {
    config: RedditConfig,
    http: Client,
    token: RwLock<Option<AccessToken>>,
}

impl RedditConnection {
    pub fn new(config: RedditConfig) -> Result<Self, PlatformError> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            config,
            http,
            token: RwLock::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<AccessToken, PlatformError> {
        let params = [
            ("grant_type", "password"),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::UNAUTHORIZED {
            return Err(PlatformError::Auth(
                "client id or client secret rejected".to_string(),
            ));
        }
        check_status(status, &body)?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| PlatformError::Payload(format!("token response: {e}")))?;
        // A bad username/password comes back as HTTP 200 with an error field.
        if let Some(error) = parsed.error {
            return Err(PlatformError::Auth(error));
        }
        let token = parsed
            .access_token
            .ok_or_else(|| PlatformError::Payload("token response missing access_token".into()))?;
        let expires_in = parsed.expires_in.unwrap_or(3600);
        Ok(AccessToken {
            token,
            expires_at: Utc::now() + Duration::seconds(expires_in as i64),
        })
    }

    /// Return a fresh bearer token, transparently re-authenticating when the
    /// cached one is missing or about to expire.
    async fn bearer(&self) -> Result<String, PlatformError> {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if token.is_fresh() {
                    return Ok(token.token.clone());
                }
            }
        }
        let fresh = self.fetch_token().await?;
        debug!("Refreshed Reddit access token");
        let value = fresh.token.clone();
        *self.token.write().await = Some(fresh);
        Ok(value)
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .get(format!("{API_BASE}{path}"))
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await?;
        read_json(response).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let bearer = self.bearer().await?;
        let response = self
            .http
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(bearer)
            .form(form)
            .send()
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl PlatformConnection for RedditConnection {
    async fn authenticate(&mut self) -> Result<String, PlatformError> {
        let me = self.get_json("/api/v1/me", &[("raw_json", "1")]).await?;
        let name = me
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| PlatformError::Auth("identity endpoint returned no username".into()))?;
        info!("Authenticated with Reddit as u/{}", name);
        Ok(name.to_string())
    }

    async fn poll_mentions(&mut self) -> Result<Vec<Mention>, PlatformError> {
        let unread = self
            .get_json("/message/unread", &[("limit", "100"), ("raw_json", "1")])
            .await?;
        let children = listing_children(&unread)?;

        let mut mentions = Vec::new();
        let mut read_ids = Vec::new();
        for child in children {
            let Some(data) = child.get("data") else {
                continue;
            };
            if let Some(name) = field_str(data, "name") {
                read_ids.push(name.to_string());
            }
            if child.get("kind").and_then(Value::as_str) != Some("t1") {
                continue;
            }
            match mention_from_message(data) {
                Some(mention) => mentions.push(mention),
                None => debug!("Skipping non-mention inbox item"),
            }
        }

        // Mark everything read so the next poll only sees new items. The
        // inbox is an at-least-once feed; the loop tolerates the occasional
        // replay if this call fails mid-way.
        if !read_ids.is_empty() {
            let joined = read_ids.join(",");
            self.post_form("/api/read_message", &[("id", joined.as_str())])
                .await?;
        }

        // The listing is newest-first; the loop wants arrival order.
        mentions.reverse();
        Ok(mentions)
    }

    async fn fetch_submission(&self, submission_id: &str) -> Result<Submission, PlatformError> {
        let path = format!("/comments/{}", urlencoding::encode(submission_id));
        let payload = self
            .get_json(&path, &[("depth", "1"), ("limit", "500"), ("raw_json", "1")])
            .await?;
        let parts = payload
            .as_array()
            .filter(|a| a.len() == 2)
            .ok_or_else(|| {
                PlatformError::Payload("comments response is not a two-part listing".into())
            })?;

        let submission_data = listing_children(&parts[0])?
            .first()
            .and_then(|c| c.get("data"))
            .ok_or_else(|| PlatformError::Payload("comments response missing submission".into()))?;
        let author = author_of(submission_data);

        let top_parent = format!("t3_{submission_id}");
        let mut comments = Vec::new();
        let mut more_ids: Vec<String> = Vec::new();
        for child in listing_children(&parts[1])? {
            collect_comment_node(child, &top_parent, &mut comments, &mut more_ids);
        }

        // Resolve every collapsed placeholder before handing the comment set
        // to the caller; the loop must never see a partial tree.
        while !more_ids.is_empty() {
            let split = more_ids.len().min(MORECHILDREN_BATCH);
            let chunk: Vec<String> = more_ids.drain(..split).collect();
            let children_param = chunk.join(",");
            let form = [
                ("api_type", "json"),
                ("link_id", top_parent.as_str()),
                ("children", children_param.as_str()),
            ];
            let resolved = self.post_form("/api/morechildren", &form).await?;
            let things = resolved
                .pointer("/json/data/things")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    PlatformError::Payload("morechildren response missing things".into())
                })?;
            for thing in things {
                collect_comment_node(thing, &top_parent, &mut comments, &mut more_ids);
            }
        }

        debug!(
            "Fetched {} top-level comments for submission {}",
            comments.len(),
            submission_id
        );
        Ok(Submission {
            id: submission_id.to_string(),
            author,
            comments,
        })
    }

    async fn community_moderators(&self, subreddit: &str) -> Result<Vec<String>, PlatformError> {
        let path = format!("/r/{}/about/moderators", urlencoding::encode(subreddit));
        let payload = self.get_json(&path, &[("raw_json", "1")]).await?;
        let children = listing_children(&payload)?;
        Ok(children
            .iter()
            .filter_map(|c| c.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    async fn post_reply(&self, mention: &Mention, body: &str) -> Result<(), PlatformError> {
        let thing_id = format!("t1_{}", mention.id);
        let form = [
            ("api_type", "json"),
            ("thing_id", thing_id.as_str()),
            ("text", body),
        ];
        let payload = self.post_form("/api/comment", &form).await?;
        if let Some(errors) = payload.pointer("/json/errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(PlatformError::Rejected(format!(
                    "comment not accepted: {errors:?}"
                )));
            }
        }
        info!("Replied to mention {} in r/{}", mention.id, mention.subreddit);
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "reddit"
    }
}

fn check_status(status: StatusCode, body: &str) -> Result<(), PlatformError> {
    if status.is_server_error() {
        Err(PlatformError::Server {
            status: status.as_u16(),
        })
    } else if status.is_client_error() {
        Err(PlatformError::Client {
            status: status.as_u16(),
            body: snippet(body),
        })
    } else {
        Ok(())
    }
}

async fn read_json(response: Response) -> Result<Value, PlatformError> {
    let status = response.status();
    let body = response.text().await?;
    check_status(status, &body)?;
    serde_json::from_str(&body)
        .map_err(|e| PlatformError::Payload(format!("invalid JSON from the API: {e}")))
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(200).collect()
}

fn listing_children(value: &Value) -> Result<&Vec<Value>, PlatformError> {
    value
        .get("data")
        .and_then(|d| d.get("children"))
        .and_then(Value::as_array)
        .ok_or_else(|| PlatformError::Payload("response is not a listing".into()))
}

fn field_str<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

fn author_of(data: &Value) -> Option<String> {
    match field_str(data, "author") {
        Some("[deleted]") | None => None,
        Some(name) => Some(name.to_string()),
    }
}

/// Build a [`Mention`] from an unread inbox message, or `None` when the item
/// is not a username mention (e.g., a private message or comment reply).
fn mention_from_message(data: &Value) -> Option<Mention> {
    if !data.get("was_comment").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    if field_str(data, "subject") != Some("username mention") {
        return None;
    }
    let context = field_str(data, "context")?;
    let submission_id = submission_id_from_context(context)?;
    let created = data.get("created_utc").and_then(Value::as_f64).unwrap_or(0.0);
    Some(Mention {
        id: field_str(data, "id")?.to_string(),
        author: field_str(data, "author")?.to_string(),
        subreddit: field_str(data, "subreddit")?.to_string(),
        submission_id,
        body: field_str(data, "body")?.to_string(),
        timestamp: DateTime::from_timestamp(created as i64, 0).unwrap_or_else(Utc::now),
    })
}

/// Inbox messages carry no link id; pull the submission id out of the
/// permalink-style `context` field
/// (`/r/<sub>/comments/<id>/<slug>/<comment>/?context=3`).
fn submission_id_from_context(context: &str) -> Option<String> {
    let mut segments = context.split('/').filter(|s| !s.is_empty());
    while let Some(segment) = segments.next() {
        if segment == "comments" {
            return segments.next().map(str::to_string);
        }
    }
    None
}

/// Accumulate a comment-tree node: direct replies to the submission land in
/// `comments`, placeholder ids queue up in `more_ids` for resolution.
fn collect_comment_node(
    node: &Value,
    top_parent: &str,
    comments: &mut Vec<Comment>,
    more_ids: &mut Vec<String>,
) {
    let kind = node.get("kind").and_then(Value::as_str).unwrap_or_default();
    let Some(data) = node.get("data") else {
        return;
    };
    match kind {
        "t1" => {
            if field_str(data, "parent_id") == Some(top_parent) {
                comments.push(Comment {
                    id: field_str(data, "id").unwrap_or_default().to_string(),
                    author: author_of(data),
                    body: field_str(data, "body").unwrap_or_default().to_string(),
                });
            }
        }
        "more" => {
            if let Some(ids) = data.get("children").and_then(Value::as_array) {
                more_ids.extend(ids.iter().filter_map(Value::as_str).map(str::to_string));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_id_comes_from_context_path() {
        let context = "/r/truerateme/comments/abc123/some_title/def456/?context=3";
        assert_eq!(
            submission_id_from_context(context),
            Some("abc123".to_string())
        );
        assert_eq!(submission_id_from_context("/r/truerateme/"), None);
    }

    #[test]
    fn mention_parses_from_inbox_message() {
        let data = json!({
            "was_comment": true,
            "subject": "username mention",
            "context": "/r/truerateme/comments/abc123/title/def456/?context=3",
            "id": "def456",
            "author": "some_mod",
            "subreddit": "truerateme",
            "body": "u/statsbot --ignore-op",
            "created_utc": 1700000000.0
        });
        let mention = mention_from_message(&data).expect("valid mention parses");
        assert_eq!(mention.submission_id, "abc123");
        assert_eq!(mention.author, "some_mod");
        assert!(mention.wants_op_skipped());
    }

    #[test]
    fn private_messages_are_not_mentions() {
        let data = json!({
            "was_comment": false,
            "subject": "hello",
            "id": "x",
            "author": "someone",
            "body": "hi"
        });
        assert!(mention_from_message(&data).is_none());
    }

    #[test]
    fn comment_replies_are_not_mentions() {
        let data = json!({
            "was_comment": true,
            "subject": "comment reply",
            "context": "/r/truerateme/comments/abc123/title/def456/",
            "id": "def456",
            "author": "someone",
            "subreddit": "truerateme",
            "body": "nice bot"
        });
        assert!(mention_from_message(&data).is_none());
    }

    #[test]
    fn collects_top_level_comments_and_placeholders() {
        let listing = json!([
            {"kind": "t1", "data": {"id": "c1", "parent_id": "t3_abc", "author": "a", "body": "7"}},
            {"kind": "t1", "data": {"id": "c2", "parent_id": "t1_c1", "author": "b", "body": "nested"}},
            {"kind": "more", "data": {"children": ["c3", "c4"]}}
        ]);
        let mut comments = Vec::new();
        let mut more_ids = Vec::new();
        for node in listing.as_array().expect("array") {
            collect_comment_node(node, "t3_abc", &mut comments, &mut more_ids);
        }
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(more_ids, vec!["c3".to_string(), "c4".to_string()]);
    }

    #[test]
    fn deleted_authors_become_none() {
        assert_eq!(author_of(&json!({"author": "[deleted]"})), None);
        assert_eq!(author_of(&json!({})), None);
        assert_eq!(
            author_of(&json!({"author": "someone"})),
            Some("someone".to_string())
        );
    }
}

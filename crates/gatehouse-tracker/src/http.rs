// http.rs — HttpTracker: blocking REST client for a GitHub-style tracker API.
//
// Endpoints used:
//   POST  {api_base}/repos/{repo}/issues
//   PATCH {api_base}/repos/{repo}/issues/{number}
//   POST  {api_base}/repos/{repo}/issues/{number}/comments
//
// The bearer token is read from an environment variable named in the config
// so credentials never live in config files.

use serde::Deserialize;
use serde_json::json;

use crate::client::{CommentRef, IssueRef, IssueUpdate, NewIssue, TrackerClient};
use crate::error::TrackerError;

/// Connection settings for [`HttpTracker`].
#[derive(Debug, Clone)]
pub struct HttpTrackerConfig {
    /// API base URL, e.g. `https://api.github.com`.
    pub api_base: String,

    /// Repository in `owner/name` form.
    pub repo: String,

    /// Name of the environment variable holding the bearer token.
    pub token_env: String,
}

/// Blocking HTTP client for the remote tracker.
pub struct HttpTracker {
    config: HttpTrackerConfig,
    token: String,
    client: reqwest::blocking::Client,
}

/// Issue shape returned by the tracker API (only the fields we read).
#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    html_url: String,
    title: String,
}

/// Comment shape returned by the tracker API.
#[derive(Debug, Deserialize)]
struct ApiComment {
    id: u64,
    html_url: String,
}

impl HttpTracker {
    /// Build a client, resolving the token from the configured env var.
    pub fn new(config: HttpTrackerConfig) -> Result<Self, TrackerError> {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TrackerError::MissingToken(config.token_env.clone()))?;
        Ok(Self {
            config,
            token,
            client: reqwest::blocking::Client::new(),
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/issues",
            self.config.api_base.trim_end_matches('/'),
            self.config.repo
        )
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/{}", self.issues_url(), number)
    }

    /// Map a non-success response to a TrackerError, reading the API's
    /// `message` field when present.
    fn api_error(response: reqwest::blocking::Response) -> TrackerError {
        let status = response.status().as_u16();
        let message = response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| "no error detail".to_string());
        TrackerError::Api { status, message }
    }

    fn send_json(
        &self,
        request: reqwest::blocking::RequestBuilder,
        body: serde_json::Value,
    ) -> Result<reqwest::blocking::Response, TrackerError> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "gatehouse")
            .json(&body)
            .send()?;
        if !response.status().is_success() {
            return Err(Self::api_error(response));
        }
        Ok(response)
    }
}

impl TrackerClient for HttpTracker {
    fn create_issue(&self, issue: &NewIssue) -> Result<IssueRef, TrackerError> {
        let body = json!({
            "title": issue.title,
            "body": issue.body,
            "labels": issue.labels,
        });
        let response = self.send_json(self.client.post(self.issues_url()), body)?;
        let api: ApiIssue = response.json()?;
        tracing::info!(number = api.number, "created issue on {}", self.config.repo);
        Ok(IssueRef {
            number: api.number,
            url: api.html_url,
            title: api.title,
        })
    }

    fn update_issue(&self, number: u64, update: &IssueUpdate) -> Result<IssueRef, TrackerError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = &update.title {
            body.insert("title".into(), json!(title));
        }
        if let Some(text) = &update.body {
            body.insert("body".into(), json!(text));
        }
        let response = self
            .send_json(self.client.patch(self.issue_url(number)), body.into())
            .map_err(|e| match e {
                TrackerError::Api { status: 404, .. } => TrackerError::UnknownIssue(number),
                other => other,
            })?;
        let api: ApiIssue = response.json()?;
        tracing::info!(number, "updated issue on {}", self.config.repo);
        Ok(IssueRef {
            number: api.number,
            url: api.html_url,
            title: api.title,
        })
    }

    fn add_comment(&self, number: u64, text: &str) -> Result<CommentRef, TrackerError> {
        let url = format!("{}/comments", self.issue_url(number));
        let response = self
            .send_json(self.client.post(url), json!({ "body": text }))
            .map_err(|e| match e {
                TrackerError::Api { status: 404, .. } => TrackerError::UnknownIssue(number),
                other => other,
            })?;
        let api: ApiComment = response.json()?;
        Ok(CommentRef {
            id: api.id,
            url: api.html_url,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HttpTrackerConfig {
        HttpTrackerConfig {
            api_base: "https://api.github.com/".to_string(),
            repo: "acme/widgets".to_string(),
            token_env: "GATEHOUSE_TEST_TOKEN_UNSET".to_string(),
        }
    }

    #[test]
    fn missing_token_is_rejected() {
        let result = HttpTracker::new(config());
        assert!(matches!(result, Err(TrackerError::MissingToken(_))));
    }

    #[test]
    fn urls_strip_trailing_slash() {
        // Construct without new() so no token is needed.
        let tracker = HttpTracker {
            config: config(),
            token: "t".into(),
            client: reqwest::blocking::Client::new(),
        };
        assert_eq!(
            tracker.issues_url(),
            "https://api.github.com/repos/acme/widgets/issues"
        );
        assert_eq!(
            tracker.issue_url(42),
            "https://api.github.com/repos/acme/widgets/issues/42"
        );
    }
}

//! Typed HTTP client for the exam archive API.
//!
//! [`ArchiveClient`] owns a `reqwest` client, the API base URL, and the bearer
//! token obtained from `/users/login`. Endpoint groups live in their own
//! modules (`auth`, `faculties`, `subjects`, `exams`, `users`) as further
//! `impl ArchiveClient` blocks.
//!
//! Status mapping: 401 → [`ExamArchiveError::Unauthorized`], 404 →
//! [`ExamArchiveError::NotFound`], anything else unsuccessful →
//! [`ExamArchiveError::Api`] carrying the server's `detail` message.

mod auth;
mod exams;
mod faculties;
mod subjects;
mod users;

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use examarchive_shared::{ApiConfig, ExamArchiveError, Result};

pub use exams::{TestFile, UploadRequest};
pub use faculties::FacultyFilter;
pub use subjects::SubjectFilter;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Default timeout in seconds for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Longest raw (non-JSON) error body echoed back in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("examarchive/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client options
// ---------------------------------------------------------------------------

/// Connection settings for [`ArchiveClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API base URL, e.g. `http://127.0.0.1:1739`.
    pub base_url: String,
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ClientOptions {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout_secs: if api.timeout_secs == 0 {
                DEFAULT_TIMEOUT_SECS
            } else {
                api.timeout_secs
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ArchiveClient
// ---------------------------------------------------------------------------

/// Handle to one exam archive API, optionally authenticated.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ArchiveClient {
    /// Build an unauthenticated client.
    pub fn new(opts: &ClientOptions) -> Result<Self> {
        let base = Url::parse(&opts.base_url).map_err(|e| {
            ExamArchiveError::config(format!("invalid API base URL '{}': {e}", opts.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(ExamArchiveError::config(format!(
                "API base URL '{}' cannot carry a path",
                opts.base_url
            )));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                ExamArchiveError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    /// Attach a previously issued access token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Current access token, if logged in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The API base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub(crate) fn clear_token(&mut self) {
        self.token = None;
    }

    /// Build a URL from path segments. A trailing `""` segment yields a
    /// trailing slash (`["faculties", ""]` → `/faculties/`).
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start a request, attaching the bearer token when present.
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = send(builder).await?;
        let url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ExamArchiveError::Network(format!("{url}: failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| ExamArchiveError::parse(format!("{url}: unexpected response body: {e}")))
    }

    /// Send a request whose response body is irrelevant (e.g. 204).
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        send(builder).await.map(|_| ())
    }
}

/// Send a request and turn unsuccessful statuses into errors.
pub(crate) async fn send(builder: RequestBuilder) -> Result<Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| ExamArchiveError::Network(e.to_string()))?;
    check_status(response).await
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let detail = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    debug!(%url, status = status.as_u16(), %detail, "api request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => ExamArchiveError::Unauthorized(detail),
        StatusCode::NOT_FOUND => ExamArchiveError::NotFound(detail),
        _ => ExamArchiveError::Api {
            status: status.as_u16(),
            detail,
        },
    })
}

/// Pull a human-readable message out of an error body.
///
/// The server sends `{"detail": "..."}`; validation failures carry a
/// structured `detail`, which is echoed as JSON.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return match value.get("detail") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect())
    }
}


#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn endpoint_builds_paths() {
        let client = ArchiveClient::new(&ClientOptions::default()).unwrap();
        assert_eq!(
            client.endpoint(&["faculties", ""]).as_str(),
            "http://127.0.0.1:1739/faculties/"
        );
        assert_eq!(
            client.endpoint(&["users", "login"]).as_str(),
            "http://127.0.0.1:1739/users/login"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_and_escapes_segments() {
        let opts = ClientOptions {
            base_url: "https://uni.example.edu/archive/".into(),
            timeout_secs: 5,
        };
        let client = ArchiveClient::new(&opts).unwrap();
        assert_eq!(
            client.endpoint(&["faculties", "f1", "modules", "SW IT"]).as_str(),
            "https://uni.example.edu/archive/faculties/f1/modules/SW%20IT"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let opts = ClientOptions {
            base_url: "not a url".into(),
            timeout_secs: 5,
        };
        let err = ArchiveClient::new(&opts).unwrap_err();
        assert!(err.to_string().contains("invalid API base URL"));

        let opts = ClientOptions {
            base_url: "mailto:admin@example.edu".into(),
            timeout_secs: 5,
        };
        assert!(ArchiveClient::new(&opts).is_err());
    }

    #[test]
    fn error_detail_variants() {
        assert_eq!(
            error_detail(r#"{"detail":"Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        let structured = error_detail(r#"{"detail":[{"loc":["body","email"],"msg":"bad"}]}"#)
            .expect("structured detail");
        assert!(structured.contains("\"msg\":\"bad\""));
        assert_eq!(error_detail("  Internal Server Error \n").as_deref(), Some("Internal Server Error"));
        assert_eq!(error_detail(""), None);
        assert_eq!(error_detail(r#"{"message":"x"}"#), None);
    }

    #[test]
    fn token_handling() {
        let client = ArchiveClient::new(&ClientOptions::default())
            .unwrap()
            .with_token("abc");
        assert!(client.is_authenticated());
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let api = ApiConfig {
            base_url: "http://localhost:9000".into(),
            timeout_secs: 0,
        };
        assert_eq!(ClientOptions::from(&api).timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}

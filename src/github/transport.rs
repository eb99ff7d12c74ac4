//! HTTP access to a versioned GitHub-compatible REST API.
//!
//! The transport never retries and never interprets response bodies beyond
//! telling a rate-limit rejection apart from other failures. Retry and
//! termination decisions belong to the paginator and enricher.

use crate::error::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const API_VERSION: &str = "2022-11-28";

/// Outcome of a single request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Success(Value),
    RateLimited,
    HttpError(u16),
}

/// Issues one GET request against the API.
///
/// `path` is either a path relative to the configured base URL
/// (`/repos/acme/widgets/commits`) or an absolute URL taken verbatim from a
/// previous response.
pub trait Transport: Send + Sync {
    fn request(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        (**self).request(path, params)
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: format!("commitscope/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiConfig {
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Blocking transport backed by a shared `ureq` agent.
pub struct HttpTransport {
    config: ApiConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: ApiConfig) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        Self { config, agent }
    }
}

impl Transport for HttpTransport {
    fn request(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let url = self.config.resolve_url(path);
        debug!(%url, ?params, "GET");

        let mut req = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", &self.config.user_agent);
        if let Some(token) = &self.config.token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        for (key, value) in params {
            req = req.query(*key, value);
        }

        let response = req.call()?;
        let status = response.status().as_u16();
        let budget_exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0");

        if (200..300).contains(&status) {
            let body: Value = response.into_body().read_json()?;
            return Ok(ApiResponse::Success(body));
        }

        let body = response.into_body().read_to_string().unwrap_or_default();
        let outcome = classify_failure(status, budget_exhausted, &body);
        debug!(%url, status, ?outcome, "request failed");
        Ok(outcome)
    }
}

/// Tell a rate-limit rejection apart from any other non-2xx status.
pub fn classify_failure(status: u16, budget_exhausted: bool, body: &str) -> ApiResponse {
    match status {
        429 => ApiResponse::RateLimited,
        403 if budget_exhausted || body.to_lowercase().contains("rate limit") => {
            ApiResponse::RateLimited
        }
        _ => ApiResponse::HttpError(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_base_and_absolute_urls_pass_through() {
        let config = ApiConfig::default().with_base_url("https://ghe.example.test/api/v3/");
        assert_eq!(
            config.resolve_url("/repos/acme/widgets/commits"),
            "https://ghe.example.test/api/v3/repos/acme/widgets/commits"
        );
        assert_eq!(
            config.resolve_url("rate_limit"),
            "https://ghe.example.test/api/v3/rate_limit"
        );
        let detail = "https://api.github.com/repos/acme/widgets/commits/abc";
        assert_eq!(config.resolve_url(detail), detail);
    }

    #[test]
    fn blank_token_means_unauthenticated() {
        assert!(!ApiConfig::default().with_token(Some("  ".into())).is_authenticated());
        assert!(ApiConfig::default().with_token(Some("ghp_x".into())).is_authenticated());
        assert!(!ApiConfig::default().with_token(None).is_authenticated());
    }

    #[test]
    fn rate_limit_signals_are_distinct_from_errors() {
        assert_eq!(classify_failure(429, false, ""), ApiResponse::RateLimited);
        assert_eq!(classify_failure(403, true, ""), ApiResponse::RateLimited);
        assert_eq!(
            classify_failure(403, false, r#"{"message":"API rate limit exceeded for 1.2.3.4"}"#),
            ApiResponse::RateLimited
        );
        assert_eq!(
            classify_failure(403, false, r#"{"message":"Resource not accessible"}"#),
            ApiResponse::HttpError(403)
        );
        assert_eq!(classify_failure(404, false, ""), ApiResponse::HttpError(404));
        assert_eq!(classify_failure(502, true, ""), ApiResponse::HttpError(502));
    }
}

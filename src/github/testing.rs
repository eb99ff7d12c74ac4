use super::transport::{ApiResponse, Transport};
use crate::error::{Result, ScopeError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const BASE: &str = "https://api.test";

/// Canned responses keyed by `path?k=v&k=v` (params sorted by key).
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, ApiResponse>,
    failures: Vec<String>,
    delay: Option<Duration>,
    log: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, key: &str, response: ApiResponse) -> Self {
        self.routes.insert(key.to_string(), response);
        self
    }

    pub fn ok(self, key: &str, body: Value) -> Self {
        self.on(key, ApiResponse::Success(body))
    }

    /// Make `key` fail at the network level.
    pub fn unreachable(mut self, key: &str) -> Self {
        self.failures.push(key.to_string());
        self
    }

    /// Sleep on every request, widening race windows between callers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.requests().iter().filter(|k| *k == key).count()
    }
}

pub fn route_key(path: &str, params: &[(&str, String)]) -> String {
    let path = path.strip_prefix(BASE).unwrap_or(path);
    if params.is_empty() {
        return path.to_string();
    }
    let mut sorted: Vec<_> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    sorted.sort();
    format!("{path}?{}", sorted.join("&"))
}

impl Transport for ScriptedTransport {
    fn request(&self, path: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let key = route_key(path, params);
        self.log.lock().unwrap().push(key.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.failures.contains(&key) {
            return Err(ScopeError::Network(format!("connection reset: {key}")));
        }
        Ok(self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or(ApiResponse::HttpError(404)))
    }
}

pub fn commit_item(repo: &str, sha: &str, login: Option<&str>, date: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "url": format!("{BASE}/repos/{repo}/commits/{sha}"),
        "commit": {
            "author": { "name": "someone", "date": date },
            "message": message
        },
        "author": login.map(|l| json!({ "login": l }))
    })
}

pub fn detail_item(
    repo: &str,
    sha: &str,
    login: Option<&str>,
    date: &str,
    message: &str,
    files: &[(&str, &str)],
) -> Value {
    let mut item = commit_item(repo, sha, login, date, message);
    item["files"] = Value::Array(
        files
            .iter()
            .map(|(path, status)| {
                json!({ "filename": path, "status": status, "additions": 1, "deletions": 0 })
            })
            .collect(),
    );
    item
}

/// `count` list items `prefix0..prefixN` for one author on one date.
pub fn page_of(repo: &str, prefix: &str, count: usize, login: &str, date: &str) -> Value {
    Value::Array(
        (0..count)
            .map(|i| commit_item(repo, &format!("{prefix}{i}"), Some(login), date, "chore: tick"))
            .collect(),
    )
}

//! Upstream JSON shapes. Only the fields the engine reads are declared.

use crate::error::{Result, ScopeError};
use crate::model::{CommitDetail, CommitSummary, FileChange, FileStatus, RateLimitStatus};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommit {
    pub sha: String,
    pub url: String,
    pub commit: ApiCommitBody,
    pub author: Option<ApiUser>,
    #[serde(default)]
    pub files: Option<Vec<ApiFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiCommitBody {
    pub author: Option<ApiSignature>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSignature {
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

impl ApiCommit {
    pub fn into_summary(self, repository: &str) -> Result<CommitSummary> {
        let author_date = self
            .commit
            .author
            .and_then(|a| a.date)
            .ok_or_else(|| {
                ScopeError::malformed(repository, format!("commit {} has no author date", self.sha))
            })?;
        Ok(CommitSummary {
            sha: self.sha,
            author_login: self.author.map(|u| u.login),
            author_date,
            message: self.commit.message,
            detail_url: self.url,
        })
    }

    /// Attach the detail's file list to an already-listed summary.
    pub fn into_detail(self, summary: &CommitSummary) -> CommitDetail {
        let files = self
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| FileChange {
                path: f.filename,
                status: FileStatus::from(f.status),
                additions: f.additions,
                deletions: f.deletions,
            })
            .collect();
        CommitDetail {
            summary: summary.clone(),
            files,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRepository {
    pub full_name: String,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContributor {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTree {
    pub tree: Option<Vec<ApiTreeEntry>>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateLimit {
    pub resources: ApiRateResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateResources {
    pub core: ApiRateWindow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRateWindow {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
}

impl From<ApiRateLimit> for RateLimitStatus {
    fn from(raw: ApiRateLimit) -> Self {
        RateLimitStatus {
            limit: raw.resources.core.limit,
            remaining: raw.resources.core.remaining,
            reset_epoch_seconds: raw.resources.core.reset,
        }
    }
}

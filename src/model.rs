use crate::error::{Result, ScopeError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_VERSION: u32 = 1;

/// `owner/name` identifier of a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        if owner.is_empty() || name.is_empty() || owner.contains('/') || name.contains('/') {
            return Err(ScopeError::InvalidRepository(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// API path prefix for this repository, e.g. `/repos/acme/widgets`.
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name)) => Self::new(owner, name)
                .map_err(|_| ScopeError::InvalidRepository(trimmed.to_string())),
            None => Err(ScopeError::InvalidRepository(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RepositoryId> for String {
    fn from(id: RepositoryId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Insertion-ordered set of repositories; duplicates are ignored.
#[derive(Debug, Clone, Default)]
pub struct RepositorySet {
    order: Vec<RepositoryId>,
    seen: HashSet<RepositoryId>,
}

impl RepositorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the repository was already tracked.
    pub fn insert(&mut self, id: RepositoryId) -> bool {
        if !self.seen.insert(id.clone()) {
            return false;
        }
        self.order.push(id);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryId> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[RepositoryId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<RepositoryId> for RepositorySet {
    fn from_iter<I: IntoIterator<Item = RepositoryId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    pub author_login: Option<String>,
    pub author_date: DateTime<Utc>,
    pub message: String,
    pub detail_url: String,
}

impl CommitSummary {
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

impl AsRef<CommitSummary> for CommitSummary {
    fn as_ref(&self) -> &CommitSummary {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(flatten)]
    pub summary: CommitSummary,
    pub files: Vec<FileChange>,
}

impl AsRef<CommitSummary> for CommitDetail {
    fn as_ref(&self) -> &CommitSummary {
        &self.summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    /// Any other upstream status (`renamed`, `copied`, `changed`, ...).
    Other(String),
}

impl From<String> for FileStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "added" => FileStatus::Added,
            "modified" => FileStatus::Modified,
            "removed" => FileStatus::Removed,
            _ => FileStatus::Other(raw),
        }
    }
}

impl From<FileStatus> for String {
    fn from(status: FileStatus) -> Self {
        match status {
            FileStatus::Added => "added".to_string(),
            FileStatus::Modified => "modified".to_string(),
            FileStatus::Removed => "removed".to_string(),
            FileStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Backend,
    Frontend,
    Docs,
    Config,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Backend,
        Category::Frontend,
        Category::Docs,
        Category::Config,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Backend => "backend",
            Category::Frontend => "frontend",
            Category::Docs => "docs",
            Category::Config => "config",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Chore,
    Other,
}

impl CommitType {
    /// Declared prefixes in classification priority order.
    pub const DECLARED: [CommitType; 8] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
            CommitType::Other => "other",
        }
    }
}

impl FromStr for CommitType {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        CommitType::DECLARED
            .iter()
            .chain(std::iter::once(&CommitType::Other))
            .find(|t| t.as_str() == lowered)
            .copied()
            .ok_or_else(|| ScopeError::InvalidFilter(s.to_string()))
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeFilter {
    #[default]
    All,
    Only(CommitType),
}

impl TryFrom<String> for TypeFilter {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeFilter> for String {
    fn from(filter: TypeFilter) -> Self {
        filter.to_string()
    }
}

impl FromStr for TypeFilter {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(TypeFilter::All)
        } else {
            s.parse().map(TypeFilter::Only)
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.write_str("all"),
            TypeFilter::Only(t) => t.fmt(f),
        }
    }
}

/// Inclusive author-date window; an unset bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new() -> Self {
        Self { from: None, to: None }
    }

    pub fn with_from(mut self, from: NaiveDate) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_to(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        let day = timestamp.date_naive();
        if let Some(from) = self.from {
            if day < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if day > to {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u64,
    pub remaining: u64,
    pub reset_epoch_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Ok,
    RateLimitExceeded,
    PartialFailure { repository: String, reason: String },
    NoData,
}

impl RunStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, RunStatus::Ok)
    }

    /// Combine per-listing statuses; rate limiting dominates, then failures.
    pub fn merge(statuses: &[RunStatus]) -> RunStatus {
        if statuses.iter().any(|s| matches!(s, RunStatus::RateLimitExceeded)) {
            return RunStatus::RateLimitExceeded;
        }
        if let Some(failure) = statuses
            .iter()
            .find(|s| matches!(s, RunStatus::PartialFailure { .. }))
        {
            return failure.clone();
        }
        if statuses.iter().any(RunStatus::is_ok) {
            RunStatus::Ok
        } else {
            RunStatus::NoData
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ok => f.write_str("ok"),
            RunStatus::RateLimitExceeded => f.write_str("rate limit exceeded"),
            RunStatus::PartialFailure { repository, reason } => {
                write!(f, "partial failure in {repository}: {reason}")
            }
            RunStatus::NoData => f.write_str("no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorSeries {
    pub login: String,
    pub counts: Vec<u32>,
}

/// Weekly commit counts per contributor, aligned on a shared week axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub weeks: Vec<NaiveDate>,
    pub series: Vec<ContributorSeries>,
}

pub type CategoryHistogram = BTreeMap<Category, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySummary {
    pub directory: String,
    pub commit_count: u32,
    pub added: u32,
    pub modified: u32,
    pub removed: u32,
}

impl DirectorySummary {
    pub fn new(directory: String) -> Self {
        Self {
            directory,
            commit_count: 0,
            added: 0,
            modified: 0,
            removed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRow {
    pub sha: String,
    pub short_sha: String,
    pub title: String,
    pub commit_type: CommitType,
    pub author_date: DateTime<Utc>,
    pub files_changed: usize,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationResult {
    pub weekly: WeeklySeries,
    pub categories: BTreeMap<String, CategoryHistogram>,
    pub directories: Vec<DirectorySummary>,
    pub commits: BTreeMap<String, Vec<CommitRow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository: RepositoryId,
    pub window: DateWindow,
    pub type_filter: TypeFilter,
    #[serde(flatten)]
    pub status: RunStatus,
    pub truncated: bool,
    pub result: AggregationResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentCommit {
    pub repository: RepositoryId,
    #[serde(flatten)]
    pub commit: CommitSummary,
    pub commit_type: CommitType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSummary {
    pub repository: RepositoryId,
    pub branch: String,
    pub files: usize,
    pub categories: CategoryHistogram,
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn repository_id_parses_owner_and_name() {
        let id: RepositoryId = "acme/widgets".parse().unwrap();
        assert_eq!(id.owner(), "acme");
        assert_eq!(id.name(), "widgets");
        assert_eq!(id.api_path(), "/repos/acme/widgets");
        assert!("acme".parse::<RepositoryId>().is_err());
        assert!("acme/".parse::<RepositoryId>().is_err());
        assert!("a/b/c".parse::<RepositoryId>().is_err());
    }

    #[test]
    fn repository_set_deduplicates_on_insert() {
        let mut set = RepositorySet::new();
        assert!(set.insert("acme/widgets".parse().unwrap()));
        assert!(set.insert("acme/gadgets".parse().unwrap()));
        assert!(!set.insert("acme/widgets".parse().unwrap()));
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].to_string(), "acme/widgets");
    }

    #[test]
    fn date_window_bounds_are_inclusive() {
        let window = DateWindow::new()
            .with_from(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_to(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert!(window.contains(&first));
        assert!(window.contains(&last));
        assert!(!window.contains(&after));
        assert!(!window.contains(&before));
        assert!(DateWindow::new().contains(&after));
    }

    #[test]
    fn type_filter_parses_all_and_types() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!(
            "FIX".parse::<TypeFilter>().unwrap(),
            TypeFilter::Only(CommitType::Fix)
        );
        assert!("bugfix".parse::<TypeFilter>().is_err());
    }

    #[test]
    fn file_status_keeps_unknown_values() {
        assert_eq!(FileStatus::from("added".to_string()), FileStatus::Added);
        assert_eq!(
            FileStatus::from("renamed".to_string()),
            FileStatus::Other("renamed".to_string())
        );
    }

    #[test]
    fn run_status_merge_prefers_rate_limit() {
        let merged = RunStatus::merge(&[
            RunStatus::Ok,
            RunStatus::PartialFailure {
                repository: "acme/widgets".into(),
                reason: "boom".into(),
            },
            RunStatus::RateLimitExceeded,
        ]);
        assert_eq!(merged, RunStatus::RateLimitExceeded);
        assert_eq!(RunStatus::merge(&[RunStatus::NoData]), RunStatus::NoData);
        assert_eq!(RunStatus::merge(&[RunStatus::NoData, RunStatus::Ok]), RunStatus::Ok);
    }
}

//! Commit statistics for GitHub-like REST APIs.
//!
//! Commits are listed page by page, enriched with their per-file changes,
//! classified by path and message, and aggregated into weekly, category,
//! directory and commit-list views.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod engine;
pub mod error;
pub mod filter;
pub mod github;
pub mod model;
pub mod output;
pub mod run;
pub mod util;

pub use cache::Cache;
pub use engine::{Analysis, Engine, ListingOutcome, RecentCommits, RepositoryFetch, RunOptions};
pub use error::{Result, ScopeError};
pub use filter::CommitFilter;
pub use run::{RunSlot, RunToken, RunTracker};

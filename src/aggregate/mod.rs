pub mod categories;
pub mod commits;
pub mod directories;
pub mod weekly;

pub use categories::{category_histogram, empty_histogram};
pub use commits::commit_rows;
pub use directories::directory_summary;
pub use weekly::weekly_series;

use crate::filter::CommitFilter;
use crate::model::{AggregationResult, CommitDetail};
use std::collections::BTreeMap;

/// Build all four views from freshly fetched commits.
///
/// `by_contributor` feeds the per-contributor views; `repository` feeds the
/// directory summary, which ignores contributor selection.
pub fn aggregate(
    by_contributor: &BTreeMap<String, Vec<CommitDetail>>,
    repository: &[CommitDetail],
    filter: &CommitFilter,
) -> AggregationResult {
    AggregationResult {
        weekly: weekly_series(by_contributor, filter),
        categories: by_contributor
            .iter()
            .map(|(login, commits)| (login.clone(), category_histogram(commits, filter)))
            .collect(),
        directories: directory_summary(repository, filter),
        commits: by_contributor
            .iter()
            .map(|(login, commits)| (login.clone(), commit_rows(commits, filter)))
            .collect(),
    }
}

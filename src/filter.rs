use crate::classify::classify_type;
use crate::model::{CommitSummary, DateWindow, TypeFilter};

/// Commit-type and author-date criteria shared by every aggregation view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitFilter {
    pub type_filter: TypeFilter,
    pub window: DateWindow,
}

impl CommitFilter {
    pub fn new(type_filter: TypeFilter, window: DateWindow) -> Self {
        Self { type_filter, window }
    }

    pub fn matches(&self, commit: &CommitSummary) -> bool {
        matches(commit, self.type_filter, &self.window)
    }

    /// Order-preserving selection of the commits that pass.
    pub fn apply<'a, C: AsRef<CommitSummary>>(&self, commits: &'a [C]) -> Vec<&'a C> {
        commits.iter().filter(|c| self.matches(c.as_ref())).collect()
    }
}

pub fn matches(commit: &CommitSummary, type_filter: TypeFilter, window: &DateWindow) -> bool {
    let type_ok = match type_filter {
        TypeFilter::All => true,
        TypeFilter::Only(wanted) => classify_type(&commit.message) == wanted,
    };
    type_ok && window.contains(&commit.author_date)
}

use crate::classify::categorize;
use crate::filter::CommitFilter;
use crate::model::{Category, CategoryHistogram, CommitDetail};

pub fn empty_histogram() -> CategoryHistogram {
    Category::ALL.iter().map(|c| (*c, 0)).collect()
}

/// File-change occurrences per category across every matched commit.
pub fn category_histogram(commits: &[CommitDetail], filter: &CommitFilter) -> CategoryHistogram {
    let mut histogram = empty_histogram();
    for commit in filter.apply(commits) {
        for file in &commit.files {
            *histogram.entry(categorize(&file.path)).or_insert(0) += 1;
        }
    }
    histogram
}

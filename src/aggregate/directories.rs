use crate::filter::CommitFilter;
use crate::model::{CommitDetail, DirectorySummary, FileStatus};
use crate::util::top_level_dir;
use std::collections::{HashMap, HashSet};

/// Change summary per top-level directory over every matched commit.
///
/// `commit_count` counts distinct shas per directory. File statuses other
/// than added/modified/removed still count the commit but touch no counter.
pub fn directory_summary(commits: &[CommitDetail], filter: &CommitFilter) -> Vec<DirectorySummary> {
    let mut dirs: HashMap<&str, (DirectorySummary, HashSet<&str>)> = HashMap::new();

    for commit in filter.apply(commits) {
        for file in &commit.files {
            let directory = top_level_dir(&file.path);
            let (summary, shas) = dirs
                .entry(directory)
                .or_insert_with(|| (DirectorySummary::new(directory.to_string()), HashSet::new()));
            shas.insert(commit.summary.sha.as_str());
            match file.status {
                FileStatus::Added => summary.added += 1,
                FileStatus::Modified => summary.modified += 1,
                FileStatus::Removed => summary.removed += 1,
                FileStatus::Other(_) => {}
            }
        }
    }

    let mut summaries: Vec<DirectorySummary> = dirs
        .into_values()
        .map(|(mut summary, shas)| {
            summary.commit_count = shas.len() as u32;
            summary
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.commit_count
            .cmp(&a.commit_count)
            .then_with(|| a.directory.cmp(&b.directory))
    });
    summaries
}

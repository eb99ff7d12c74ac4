use crate::classify::classify_type;
use crate::filter::CommitFilter;
use crate::model::{CommitDetail, CommitRow};
use crate::util::short_sha;

/// Matched commits as display rows, newest first.
pub fn commit_rows(commits: &[CommitDetail], filter: &CommitFilter) -> Vec<CommitRow> {
    let mut rows: Vec<CommitRow> = filter
        .apply(commits)
        .into_iter()
        .map(|commit| CommitRow {
            sha: commit.summary.sha.clone(),
            short_sha: short_sha(&commit.summary.sha),
            title: commit.summary.title().to_string(),
            commit_type: classify_type(&commit.summary.message),
            author_date: commit.summary.author_date,
            files_changed: commit.files.len(),
            additions: commit.files.iter().map(|f| u64::from(f.additions)).sum(),
            deletions: commit.files.iter().map(|f| u64::from(f.deletions)).sum(),
        })
        .collect();

    rows.sort_by(|a, b| b.author_date.cmp(&a.author_date).then_with(|| a.sha.cmp(&b.sha)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitSummary, CommitType, FileChange, FileStatus};
    use chrono::{TimeZone, Utc};

    fn detail(sha: &str, day: u32, message: &str) -> CommitDetail {
        CommitDetail {
            summary: CommitSummary {
                sha: sha.to_string(),
                author_login: Some("octo".into()),
                author_date: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
                message: message.to_string(),
                detail_url: String::new(),
            },
            files: vec![FileChange {
                path: "src/a.rs".into(),
                status: FileStatus::Modified,
                additions: 4,
                deletions: 2,
            }],
        }
    }

    #[test]
    fn newest_first_with_first_line_titles() {
        let commits = vec![
            detail("0123456789abcdef", 1, "fix: old\n\nbody"),
            detail("fedcba9876543210", 9, "feat: new"),
        ];
        let rows = commit_rows(&commits, &CommitFilter::default());
        assert_eq!(rows[0].short_sha, "fedcba98");
        assert_eq!(rows[0].commit_type, CommitType::Feat);
        assert_eq!(rows[1].title, "fix: old");
        assert_eq!(rows[1].additions, 4);
        assert_eq!(rows[1].deletions, 2);
        assert_eq!(rows[1].files_changed, 1);
    }
}

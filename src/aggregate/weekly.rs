use crate::filter::CommitFilter;
use crate::model::{CommitSummary, ContributorSeries, WeeklySeries};
use crate::util::week_start;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Weekly commit counts per contributor on a shared, ascending week axis.
///
/// The axis is the union of every contributor's active weeks; a contributor
/// with no commits in one of those weeks gets a 0 there.
pub fn weekly_series<C: AsRef<CommitSummary>>(
    by_contributor: &BTreeMap<String, Vec<C>>,
    filter: &CommitFilter,
) -> WeeklySeries {
    let mut per_login: Vec<(&String, HashMap<NaiveDate, u32>)> = Vec::new();
    let mut axis: BTreeSet<NaiveDate> = BTreeSet::new();

    for (login, commits) in by_contributor {
        let mut weeks: HashMap<NaiveDate, u32> = HashMap::new();
        for commit in filter.apply(commits) {
            let week = week_start(&commit.as_ref().author_date);
            *weeks.entry(week).or_insert(0) += 1;
            axis.insert(week);
        }
        per_login.push((login, weeks));
    }

    let weeks: Vec<NaiveDate> = axis.into_iter().collect();
    let series = per_login
        .into_iter()
        .map(|(login, counts)| ContributorSeries {
            login: login.clone(),
            counts: weeks
                .iter()
                .map(|w| counts.get(w).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    WeeklySeries { weeks, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitType, DateWindow, TypeFilter};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn commit(sha: &str, message: &str, y: i32, m: u32, d: u32) -> CommitSummary {
        CommitSummary {
            sha: sha.to_string(),
            author_login: None,
            author_date: Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap(),
            message: message.to_string(),
            detail_url: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn disjoint_weeks_are_unioned_and_zero_filled() {
        let mut by = BTreeMap::new();
        by.insert(
            "alice".to_string(),
            vec![
                commit("a1", "feat: x", 2024, 3, 5),
                commit("a2", "fix: y", 2024, 3, 7),
            ],
        );
        by.insert(
            "bob".to_string(),
            vec![
                commit("b1", "feat: z", 2024, 3, 20),
                commit("b2", "docs: w", 2024, 2, 26),
            ],
        );

        let weekly = weekly_series(&by, &CommitFilter::default());
        assert_eq!(
            weekly.weeks,
            vec![day(2024, 2, 26), day(2024, 3, 4), day(2024, 3, 18)]
        );
        assert_eq!(
            weekly.series,
            vec![
                ContributorSeries { login: "alice".into(), counts: vec![0, 2, 0] },
                ContributorSeries { login: "bob".into(), counts: vec![1, 0, 1] },
            ]
        );
    }

    #[test]
    fn filtered_out_weeks_do_not_reach_the_axis() {
        let mut by = BTreeMap::new();
        by.insert(
            "alice".to_string(),
            vec![
                commit("a1", "feat: x", 2024, 3, 5),
                commit("a2", "fix: y", 2024, 4, 9),
            ],
        );
        let filter = CommitFilter::new(TypeFilter::Only(CommitType::Fix), DateWindow::new());
        let weekly = weekly_series(&by, &filter);
        assert_eq!(weekly.weeks, vec![day(2024, 4, 8)]);
        assert_eq!(weekly.series[0].counts, vec![1]);
    }

    #[test]
    fn contributor_without_matches_keeps_an_all_zero_series() {
        let mut by: BTreeMap<String, Vec<CommitSummary>> = BTreeMap::new();
        by.insert("alice".to_string(), vec![commit("a1", "feat: x", 2024, 3, 5)]);
        by.insert("idle".to_string(), vec![]);
        let weekly = weekly_series(&by, &CommitFilter::default());
        assert_eq!(weekly.series[1].counts, vec![0]);
    }
}

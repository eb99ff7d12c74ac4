use crate::engine::{Analysis, RecentCommits};
use crate::filter::CommitFilter;
use crate::model::{
    AnalysisOutput, Category, CategoryHistogram, CommitRow, DirectorySummary, RateLimitStatus,
    RepositoryId, RunStatus, TreeSummary, WeeklySeries, SCHEMA_VERSION,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::collections::BTreeMap;

const RULE_WIDTH: usize = 72;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_ndjson<'a, T: Serialize + 'a>(items: impl IntoIterator<Item = &'a T>) -> Result<()> {
    for item in items {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}

pub fn analysis_output(analysis: &Analysis, filter: &CommitFilter) -> AnalysisOutput {
    AnalysisOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository: analysis.repository.clone(),
        window: filter.window,
        type_filter: filter.type_filter,
        status: analysis.status.clone(),
        truncated: analysis.truncated,
        result: analysis.result.clone(),
    }
}

/// Warn on stderr when the data shown is incomplete.
pub fn report_status(status: &RunStatus, truncated: bool) {
    match status {
        RunStatus::Ok => {}
        RunStatus::NoData => eprintln!("{}", style("No commits matched").yellow()),
        RunStatus::RateLimitExceeded => eprintln!(
            "{} results are partial; set GITHUB_TOKEN or wait for the limit to reset",
            style("Rate limit exceeded:").red().bold()
        ),
        RunStatus::PartialFailure { .. } => {
            eprintln!("{} {}", style("Warning:").yellow().bold(), status)
        }
    }
    if truncated {
        eprintln!(
            "{} history exceeds the listing ceiling, older commits were not analyzed",
            style("Truncated:").yellow().bold()
        );
    }
}

pub fn print_header(repository: &RepositoryId, filter: &CommitFilter) {
    println!("{}", style(repository).bold().cyan());
    let window = &filter.window;
    match (window.from, window.to) {
        (Some(from), Some(to)) => println!("Commits from {from} to {to}"),
        (Some(from), None) => println!("Commits since {from}"),
        (None, Some(to)) => println!("Commits until {to}"),
        (None, None) => {}
    }
    println!("Type: {}", filter.type_filter);
}

pub fn print_weekly(weekly: &WeeklySeries) {
    println!("{}", style("Weekly Commits").bold());
    println!("{}", "─".repeat(RULE_WIDTH));
    if weekly.weeks.is_empty() {
        println!("No data to display");
        return;
    }

    let max = weekly
        .series
        .iter()
        .flat_map(|s| s.counts.iter().copied())
        .max()
        .unwrap_or(1)
        .max(1);

    for series in &weekly.series {
        let total: u32 = series.counts.iter().sum();
        println!("{} ({} commits)", style(&series.login).bold(), total);
        for (week, count) in weekly.weeks.iter().zip(&series.counts) {
            let width = (*count as usize * 30) / max as usize;
            println!(
                "  {} {:<30} {:>4}",
                week,
                style("█".repeat(width)).green(),
                count
            );
        }
    }
}

pub fn print_categories(categories: &BTreeMap<String, CategoryHistogram>) {
    println!("{}", style("File Categories").bold());
    print!("{:<24}", style("Contributor").bold());
    for category in Category::ALL {
        print!(" {:>9}", style(category.as_str()).bold());
    }
    println!();
    println!("{}", "─".repeat(RULE_WIDTH));
    if categories.is_empty() {
        println!("No data to display");
        return;
    }
    for (login, histogram) in categories {
        print!("{:<24}", login);
        for category in Category::ALL {
            print!(" {:>9}", histogram.get(&category).copied().unwrap_or(0));
        }
        println!();
    }
}

pub fn print_directories(directories: &[DirectorySummary], limit: usize) {
    println!(
        "{:<40} {:>8} {:>8} {:>8} {:>8}",
        style("Directory").bold(),
        style("Commits").bold(),
        style("Added").bold(),
        style("Modified").bold(),
        style("Removed").bold()
    );
    println!("{}", "─".repeat(RULE_WIDTH + 4));
    if directories.is_empty() {
        println!("No data to display");
        return;
    }
    for d in directories.iter().take(limit) {
        println!(
            "{:<40} {:>8} {:>8} {:>8} {:>8}",
            d.directory, d.commit_count, d.added, d.modified, d.removed
        );
    }
    if directories.len() > limit {
        println!("\n... and {} more directories", directories.len() - limit);
    }
}

pub fn print_commits(commits: &BTreeMap<String, Vec<CommitRow>>, limit: usize) {
    println!("{}", style("Commits").bold());
    println!("{}", "─".repeat(RULE_WIDTH));
    if commits.values().all(Vec::is_empty) {
        println!("No data to display");
        return;
    }
    for (login, rows) in commits {
        println!("{} ({} commits)", style(login).bold(), rows.len());
        for row in rows.iter().take(limit) {
            println!(
                "  {} {} {:<8} {} {}",
                style(&row.short_sha).yellow(),
                short_date(&row.author_date),
                row.commit_type,
                style(format!("+{} -{}", row.additions, row.deletions)).dim(),
                row.title
            );
        }
        if rows.len() > limit {
            println!("  ... and {} more", rows.len() - limit);
        }
    }
}

pub fn print_recent(recent: &RecentCommits) {
    println!("{}", style("Recent Commits").bold());
    println!("{}", "─".repeat(RULE_WIDTH));
    if recent.commits.is_empty() {
        println!("No data to display");
    }
    for entry in &recent.commits {
        let commit = &entry.commit;
        println!(
            "{} {} {:<24} {:<8} {}",
            style(crate::util::short_sha(&commit.sha)).yellow(),
            short_date(&commit.author_date),
            entry.repository,
            entry.commit_type,
            commit.title()
        );
    }
    for outcome in &recent.outcomes {
        if !matches!(outcome.status, RunStatus::Ok | RunStatus::NoData) {
            eprintln!("{} {}: {}", style("Warning:").yellow().bold(), outcome.repository, outcome.status);
        }
    }
}

pub fn print_rate_limit(status: &RateLimitStatus) {
    let reset = DateTime::<Utc>::from_timestamp(status.reset_epoch_seconds, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| status.reset_epoch_seconds.to_string());
    let remaining = if status.remaining == 0 {
        style(status.remaining.to_string()).red()
    } else {
        style(status.remaining.to_string()).green()
    };
    println!("{}", style("API Rate Limit").bold());
    println!("  limit:     {}", status.limit);
    println!("  remaining: {}", remaining);
    println!("  resets at: {}", reset);
}

pub fn print_repositories(owner: &str, repositories: &[RepositoryId]) {
    println!("{} ({} repositories)", style(owner).bold(), repositories.len());
    for repository in repositories {
        println!("  {}", repository);
    }
}

pub fn print_tree(tree: &TreeSummary) {
    println!(
        "{} @ {} ({} files)",
        style(&tree.repository).bold().cyan(),
        tree.branch,
        tree.files
    );
    let max = tree.categories.values().copied().max().unwrap_or(1).max(1);
    for (category, count) in &tree.categories {
        let width = (*count as usize * 30) / max as usize;
        println!(
            "  {:<9} {:<30} {:>6}",
            category.as_str(),
            style("█".repeat(width)).blue(),
            count
        );
    }
    if tree.truncated {
        eprintln!(
            "{} the tree listing was truncated by the API",
            style("Truncated:").yellow().bold()
        );
    }
}

fn short_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

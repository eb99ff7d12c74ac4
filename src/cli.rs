use crate::cache::Cache;
use crate::engine::{Analysis, Engine, RunOptions};
use crate::filter::CommitFilter;
use crate::github::transport::{ApiConfig, HttpTransport, DEFAULT_API_URL};
use crate::model::{RepositoryId, RepositorySet, TypeFilter};
use crate::output;
use crate::run::{RunToken, RunTracker};
use crate::util::resolve_window;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "commitscope")]
#[command(about = "Per-contributor commit and file-change statistics for GitHub repositories")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Repository as owner/name (repeatable)")]
    pub repo: Vec<RepositoryId>,

    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true, help = "API token")]
    pub token: Option<String>,

    #[arg(long, global = true, env = "COMMITSCOPE_API_URL", default_value = DEFAULT_API_URL, help = "API base URL")]
    pub api_url: String,

    #[arg(long, global = true, help = "Only commits on or after this date (YYYY-MM-DD, RFC3339, or natural language)")]
    pub since: Option<String>,

    #[arg(long, global = true, help = "Only commits on or before this date (YYYY-MM-DD, RFC3339, or natural language)")]
    pub until: Option<String>,

    #[arg(long = "type", global = true, default_value = "all", help = "Commit type: all, feat, fix, docs, style, refactor, perf, test, chore, other")]
    pub commit_type: TypeFilter,

    #[arg(long, global = true, default_value_t = 16, help = "Concurrent requests")]
    pub concurrency: usize,

    #[arg(long, global = true, default_value_t = 30, help = "Per-request timeout in seconds")]
    pub timeout_secs: u64,

    #[arg(long, global = true, help = "Disable progress spinners")]
    pub no_progress: bool,
}

#[derive(Args, Clone, Default)]
pub struct OutputArgs {
    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,
}

#[derive(Args, Clone)]
pub struct ContributorArgs {
    #[arg(long, help = "Contributor login to include (repeatable)")]
    pub author: Vec<String>,

    #[arg(long, default_value_t = 5, help = "Top contributors to include when no --author is given")]
    pub top: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// All views for each repository
    Analyze {
        #[clap(flatten)]
        contributors: ContributorArgs,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Weekly commit counts per contributor
    Weekly {
        #[clap(flatten)]
        contributors: ContributorArgs,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// File-category histogram per contributor
    Categories {
        #[clap(flatten)]
        contributors: ContributorArgs,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Change summary per top-level directory
    Dirs {
        #[arg(long, default_value_t = 50, help = "Rows to show in the table")]
        limit: usize,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Matched commits per contributor
    Commits {
        #[clap(flatten)]
        contributors: ContributorArgs,
        #[arg(long, default_value_t = 20, help = "Commits to show per contributor in the table")]
        limit: usize,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Newest commits across every --repo
    Recent {
        #[arg(long, default_value_t = 20, help = "Commits to show")]
        limit: usize,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Remaining API budget
    RateLimit {
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Repositories owned by a user or organization
    Repos {
        owner: String,
        #[clap(flatten)]
        output: OutputArgs,
    },
    /// File categories in the default branch tree
    Tree {
        #[clap(flatten)]
        output: OutputArgs,
    },
}

#[derive(Clone, Copy)]
enum View {
    All,
    Weekly,
    Categories,
    Directories,
    Commits,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        let common = self.common;
        let window = resolve_window(common.since.as_deref(), common.until.as_deref())
            .context("Failed to resolve date range")?;
        let filter = CommitFilter::new(common.commit_type, window);

        match self.command {
            Commands::Analyze { contributors, output } => {
                analyze(&common, &filter, &contributors, View::All, 50, &output)
            }
            Commands::Weekly { contributors, output } => {
                analyze(&common, &filter, &contributors, View::Weekly, 0, &output)
            }
            Commands::Categories { contributors, output } => {
                analyze(&common, &filter, &contributors, View::Categories, 0, &output)
            }
            Commands::Dirs { limit, output } => {
                let none = ContributorArgs { author: Vec::new(), top: 0 };
                analyze(&common, &filter, &none, View::Directories, limit, &output)
            }
            Commands::Commits { contributors, limit, output } => {
                analyze(&common, &filter, &contributors, View::Commits, limit, &output)
            }
            Commands::Recent { limit, output } => recent(&common, &filter, limit, &output),
            Commands::RateLimit { output } => {
                let engine = engine(&common, &output)?;
                let status = engine.rate_limit().context("Failed to read rate limit")?;
                if output.json || output.ndjson {
                    output::print_json(&status)
                } else {
                    output::print_rate_limit(&status);
                    Ok(())
                }
            }
            Commands::Repos { owner, output } => {
                let engine = engine(&common, &output)?;
                let repositories = engine
                    .discover(&owner, &RunToken::detached())
                    .with_context(|| format!("Failed to list repositories for {owner}"))?;
                if output.json {
                    output::print_json(&repositories)
                } else if output.ndjson {
                    output::print_ndjson(&repositories)
                } else {
                    output::print_repositories(&owner, &repositories);
                    Ok(())
                }
            }
            Commands::Tree { output } => {
                let repositories = repositories(&common)?;
                let engine = engine(&common, &output)?;
                for repository in repositories.iter() {
                    let tree = engine
                        .tree(repository)
                        .with_context(|| format!("Failed to read tree of {repository}"))?;
                    if output.json {
                        output::print_json(&tree)?;
                    } else if output.ndjson {
                        output::print_ndjson([&tree])?;
                    } else {
                        output::print_tree(&tree);
                    }
                }
                Ok(())
            }
        }
    }
}

fn repositories(common: &CommonArgs) -> Result<RepositorySet> {
    let set: RepositorySet = common.repo.iter().cloned().collect();
    if set.is_empty() {
        bail!("At least one --repo owner/name is required");
    }
    Ok(set)
}

fn engine(common: &CommonArgs, output: &OutputArgs) -> Result<Engine<HttpTransport>> {
    let config = ApiConfig::default()
        .with_base_url(common.api_url.clone())
        .with_token(common.token.clone())
        .with_timeout(Duration::from_secs(common.timeout_secs));
    let options = RunOptions {
        concurrency: common.concurrency,
        show_progress: !common.no_progress && !output.json && !output.ndjson,
    };
    Engine::from_config(config, options).context("Failed to start worker pool")
}

fn analyze(
    common: &CommonArgs,
    filter: &CommitFilter,
    contributors: &ContributorArgs,
    view: View,
    limit: usize,
    output: &OutputArgs,
) -> Result<()> {
    let repositories = repositories(common)?;
    let engine = engine(common, output)?;
    let cache = Cache::new();
    let tracker = RunTracker::new();

    for repository in repositories.iter() {
        let run = tracker.begin();
        let logins = if !contributors.author.is_empty() {
            contributors.author.clone()
        } else if contributors.top > 0 {
            let mut all = engine
                .contributors(repository, &run)
                .with_context(|| format!("Failed to list contributors of {repository}"))?;
            all.truncate(contributors.top);
            all
        } else {
            Vec::new()
        };
        debug!(%repository, contributors = ?logins, "analyzing");

        let analysis = engine
            .analyze(repository, &logins, filter, &cache, &run)
            .with_context(|| format!("Failed to analyze {repository}"))?;
        print_analysis(&analysis, filter, view, limit, output)?;
        output::report_status(&analysis.status, analysis.truncated);
    }
    Ok(())
}

fn print_analysis(
    analysis: &Analysis,
    filter: &CommitFilter,
    view: View,
    limit: usize,
    output: &OutputArgs,
) -> Result<()> {
    let result = &analysis.result;
    if output.json {
        return match view {
            View::All => output::print_json(&output::analysis_output(analysis, filter)),
            View::Weekly => output::print_json(&result.weekly),
            View::Categories => output::print_json(&result.categories),
            View::Directories => output::print_json(&result.directories),
            View::Commits => output::print_json(&result.commits),
        };
    }
    if output.ndjson {
        return match view {
            View::All => output::print_ndjson([&output::analysis_output(analysis, filter)]),
            View::Weekly => output::print_ndjson(&result.weekly.series),
            View::Categories => output::print_ndjson([&result.categories]),
            View::Directories => output::print_ndjson(&result.directories),
            View::Commits => output::print_ndjson(result.commits.values().flatten()),
        };
    }

    output::print_header(&analysis.repository, filter);
    match view {
        View::All => {
            println!();
            output::print_weekly(&result.weekly);
            println!();
            output::print_categories(&result.categories);
            println!();
            output::print_directories(&result.directories, limit);
            println!();
            output::print_commits(&result.commits, 10);
        }
        View::Weekly => output::print_weekly(&result.weekly),
        View::Categories => output::print_categories(&result.categories),
        View::Directories => output::print_directories(&result.directories, limit),
        View::Commits => output::print_commits(&result.commits, limit),
    }
    Ok(())
}

fn recent(common: &CommonArgs, filter: &CommitFilter, limit: usize, output: &OutputArgs) -> Result<()> {
    let repositories = repositories(common)?;
    let engine = engine(common, output)?;
    let recent = engine.recent_commits(&repositories, filter, limit, &RunToken::detached());
    if output.json {
        output::print_json(&recent.commits)
    } else if output.ndjson {
        output::print_ndjson(&recent.commits)
    } else {
        output::print_recent(&recent);
        Ok(())
    }
}

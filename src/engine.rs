//! Fetch-and-aggregate orchestration.
//!
//! Listing pages are walked strictly in order; each page's details are
//! fetched concurrently on the engine's worker pool before the next page is
//! requested. Independent listings (other contributors, other repositories)
//! run concurrently and fail independently.

use crate::aggregate::aggregate;
use crate::cache::Cache;
use crate::classify::classify_type;
use crate::error::{Result, ScopeError};
use crate::filter::CommitFilter;
use crate::github::transport::{ApiConfig, HttpTransport, Transport};
use crate::github::{discover, Enricher, ListQuery, Listing, Paginator, PAGE_SIZE};
use crate::model::{
    AggregationResult, CommitDetail, CommitSummary, RateLimitStatus, RecentCommit, RepositoryId,
    RepositorySet, RunStatus, TreeSummary,
};
use crate::run::RunToken;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Worker threads shared by detail fetches and concurrent listings.
    pub concurrency: usize,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: 16,
            show_progress: false,
        }
    }
}

/// One listing (repository-wide or author-scoped) after enrichment.
#[derive(Debug, Clone)]
pub struct RepositoryFetch {
    pub repository: RepositoryId,
    pub author: Option<String>,
    pub details: Vec<CommitDetail>,
    pub status: RunStatus,
    pub truncated: bool,
    /// Details dropped because their fetch failed.
    pub dropped: usize,
}

impl RepositoryFetch {
    /// True when `details` is everything the listing produced.
    pub fn is_complete(&self) -> bool {
        matches!(self.status, RunStatus::Ok | RunStatus::NoData)
    }
}

/// How one listing of an analysis went.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingOutcome {
    /// `None` for the repository-wide listing.
    pub author: Option<String>,
    pub status: RunStatus,
    pub truncated: bool,
    pub dropped: usize,
}

impl From<&RepositoryFetch> for ListingOutcome {
    fn from(fetch: &RepositoryFetch) -> Self {
        Self {
            author: fetch.author.clone(),
            status: fetch.status.clone(),
            truncated: fetch.truncated,
            dropped: fetch.dropped,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub repository: RepositoryId,
    pub status: RunStatus,
    pub truncated: bool,
    pub listings: Vec<ListingOutcome>,
    pub result: AggregationResult,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct RepositoryOutcome {
    pub repository: RepositoryId,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RecentCommits {
    pub commits: Vec<RecentCommit>,
    pub outcomes: Vec<RepositoryOutcome>,
}

pub struct Engine<T> {
    transport: T,
    pool: rayon::ThreadPool,
    progress: Option<MultiProgress>,
}

impl Engine<HttpTransport> {
    pub fn from_config(config: ApiConfig, options: RunOptions) -> Result<Self> {
        if !config.is_authenticated() {
            info!("no API token configured, using unauthenticated requests");
        }
        Self::new(HttpTransport::new(config), options)
    }
}

impl<T: Transport> Engine<T> {
    pub fn new(transport: T, options: RunOptions) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.concurrency.max(1))
            .thread_name(|i| format!("commitscope-{i}"))
            .build()?;
        Ok(Self {
            transport,
            pool,
            progress: options.show_progress.then(MultiProgress::new),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn spinner(&self, label: String) -> Option<ProgressBar> {
        let progress = self.progress.as_ref()?;
        let pb = progress.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(label);
        Some(pb)
    }

    /// List and enrich one repository, optionally scoped to an author.
    ///
    /// On rate limiting the pages completed so far are kept, but the status
    /// says the listing is incomplete.
    pub fn fetch(
        &self,
        repository: &RepositoryId,
        query: &ListQuery,
        cache: &Cache,
        run: &RunToken,
    ) -> RepositoryFetch {
        let author = query.author.as_deref();
        let label = match author {
            Some(login) => format!("{repository} ({login})"),
            None => repository.to_string(),
        };
        let pb = self.spinner(format!("Fetching {label}..."));
        let enricher = Enricher::new(&self.transport, cache);

        let mut fetch = RepositoryFetch {
            repository: repository.clone(),
            author: query.author.clone(),
            details: Vec::new(),
            status: RunStatus::Ok,
            truncated: false,
            dropped: 0,
        };

        if let Some(listing) = cache.get_listing(repository, author) {
            debug!(
                %repository,
                cached = listing.summaries.len(),
                missing = cache.missing_details(repository, &listing.summaries).len(),
                "reusing cached listing"
            );
            fetch.truncated = listing.truncated;
            for chunk in listing.summaries.chunks(PAGE_SIZE as usize) {
                if !run.is_current() {
                    fetch.status = superseded(repository);
                    break;
                }
                let page = self.pool.install(|| enricher.enrich_page(repository, chunk));
                fetch.details.extend(page.details);
                fetch.dropped += page.dropped;
                if page.rate_limited > 0 {
                    fetch.status = RunStatus::RateLimitExceeded;
                    break;
                }
            }
            return finish(fetch, pb);
        }

        let paginator = Paginator::new(&self.transport);
        let mut pages = paginator.commits(repository, query, run);
        let mut listed: Vec<CommitSummary> = Vec::new();

        for page in pages.by_ref() {
            let summaries = match page {
                Ok(summaries) => summaries,
                Err(ScopeError::RateLimitExceeded) => {
                    fetch.status = RunStatus::RateLimitExceeded;
                    break;
                }
                Err(ScopeError::Superseded) => {
                    fetch.status = superseded(repository);
                    break;
                }
                Err(e) => {
                    warn!(%repository, error = %e, "listing failed");
                    fetch.status = RunStatus::PartialFailure {
                        repository: repository.to_string(),
                        reason: e.to_string(),
                    };
                    break;
                }
            };

            let enriched = self.pool.install(|| enricher.enrich_page(repository, &summaries));
            fetch.details.extend(enriched.details);
            fetch.dropped += enriched.dropped;
            listed.extend(summaries);
            if let Some(pb) = &pb {
                pb.set_message(format!("Fetching {label}... {} commits", listed.len()));
            }
            if enriched.rate_limited > 0 {
                fetch.status = RunStatus::RateLimitExceeded;
                break;
            }
        }
        fetch.truncated = pages.truncated();

        if fetch.status.is_ok() {
            let listing = Listing {
                summaries: listed,
                truncated: fetch.truncated,
            };
            cache.store_listing(repository, author, listing);
        }
        finish(fetch, pb)
    }

    /// Author-scoped listings for several contributors, fetched concurrently.
    pub fn fetch_contributors(
        &self,
        repository: &RepositoryId,
        logins: &[String],
        cache: &Cache,
        run: &RunToken,
    ) -> Vec<RepositoryFetch> {
        self.pool.install(|| {
            logins
                .par_iter()
                .map(|login| self.fetch(repository, &ListQuery::by_author(login), cache, run))
                .collect()
        })
    }

    /// Fetch everything one parameter set needs and build all four views.
    ///
    /// Returns `Err(Superseded)` when a newer run started meanwhile.
    pub fn analyze(
        &self,
        repository: &RepositoryId,
        contributors: &[String],
        filter: &CommitFilter,
        cache: &Cache,
        run: &RunToken,
    ) -> Result<Analysis> {
        let (whole, per_author) = self.pool.install(|| {
            rayon::join(
                || self.fetch(repository, &ListQuery::all(), cache, run),
                || self.fetch_contributors(repository, contributors, cache, run),
            )
        });

        if !run.is_current() {
            return Err(ScopeError::Superseded);
        }

        let listings: Vec<ListingOutcome> = std::iter::once(&whole)
            .chain(per_author.iter())
            .map(ListingOutcome::from)
            .collect();
        let statuses: Vec<RunStatus> = listings.iter().map(|l| l.status.clone()).collect();
        let truncated = listings.iter().any(|l| l.truncated);

        let by_contributor: BTreeMap<String, Vec<CommitDetail>> = per_author
            .into_iter()
            .filter_map(|f| f.author.map(|login| (login, f.details)))
            .collect();
        let result = aggregate(&by_contributor, &whole.details, filter);

        let mut status = RunStatus::merge(&statuses);
        if status.is_ok() && result.directories.is_empty() && result.weekly.weeks.is_empty() {
            status = RunStatus::NoData;
        }
        if truncated {
            warn!(%repository, "history longer than the page ceiling, results truncated");
        }

        Ok(Analysis {
            repository: repository.clone(),
            status,
            truncated,
            listings,
            result,
            generation: run.generation(),
        })
    }

    /// Newest commits across repositories, one listing page per repository.
    pub fn recent_commits(
        &self,
        repositories: &RepositorySet,
        filter: &CommitFilter,
        limit: usize,
        run: &RunToken,
    ) -> RecentCommits {
        let listings: Vec<(RepositoryId, Result<Vec<CommitSummary>>)> = self.pool.install(|| {
            repositories
                .as_slice()
                .par_iter()
                .map(|repo| {
                    let listing = Paginator::new(&self.transport)
                        .with_max_pages(1)
                        .list_all(repo, &ListQuery::all(), run)
                        .map(|l| l.summaries);
                    (repo.clone(), listing)
                })
                .collect()
        });

        let mut recent = RecentCommits::default();
        for (repository, listing) in listings {
            let status = match listing {
                Ok(summaries) => {
                    let matched: Vec<RecentCommit> = filter
                        .apply(&summaries)
                        .into_iter()
                        .map(|commit| RecentCommit {
                            repository: repository.clone(),
                            commit_type: classify_type(&commit.message),
                            commit: commit.clone(),
                        })
                        .collect();
                    let status = if matched.is_empty() {
                        RunStatus::NoData
                    } else {
                        RunStatus::Ok
                    };
                    recent.commits.extend(matched);
                    status
                }
                Err(ScopeError::RateLimitExceeded) => RunStatus::RateLimitExceeded,
                Err(e) => {
                    warn!(%repository, error = %e, "recent commits unavailable");
                    RunStatus::PartialFailure {
                        repository: repository.to_string(),
                        reason: e.to_string(),
                    }
                }
            };
            recent.outcomes.push(RepositoryOutcome { repository, status });
        }

        recent.commits.sort_by(|a, b| {
            b.commit
                .author_date
                .cmp(&a.commit.author_date)
                .then_with(|| a.commit.sha.cmp(&b.commit.sha))
        });
        recent.commits.truncate(limit);
        recent
    }

    pub fn rate_limit(&self) -> Result<RateLimitStatus> {
        discover::rate_limit(&self.transport)
    }

    pub fn discover(&self, owner: &str, run: &RunToken) -> Result<Vec<RepositoryId>> {
        discover::owner_repositories(&self.transport, owner, run)
    }

    pub fn contributors(&self, repository: &RepositoryId, run: &RunToken) -> Result<Vec<String>> {
        discover::contributors(&self.transport, repository, run)
    }

    pub fn tree(&self, repository: &RepositoryId) -> Result<TreeSummary> {
        discover::tree(&self.transport, repository)
    }
}

fn superseded(repository: &RepositoryId) -> RunStatus {
    RunStatus::PartialFailure {
        repository: repository.to_string(),
        reason: ScopeError::Superseded.to_string(),
    }
}

fn finish(mut fetch: RepositoryFetch, pb: Option<ProgressBar>) -> RepositoryFetch {
    if fetch.status.is_ok() && fetch.details.is_empty() {
        fetch.status = RunStatus::NoData;
    }
    if fetch.dropped > 0 {
        warn!(
            repository = %fetch.repository,
            dropped = fetch.dropped,
            "some commit details could not be fetched"
        );
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    fetch
}

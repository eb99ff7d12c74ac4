use super::transport::{ApiResponse, Transport};
use super::wire::ApiCommit;
use crate::cache::Cache;
use crate::model::{CommitDetail, CommitSummary, RepositoryId};
use rayon::prelude::*;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Enriched(CommitDetail),
    /// The detail could not be fetched or decoded; siblings are unaffected.
    Dropped,
    RateLimited,
}

#[derive(Debug, Clone, Default)]
pub struct PageEnrichment {
    pub details: Vec<CommitDetail>,
    pub dropped: usize,
    pub rate_limited: usize,
}

impl PageEnrichment {
    pub fn is_complete(&self) -> bool {
        self.dropped == 0 && self.rate_limited == 0
    }
}

pub struct Enricher<'a, T: ?Sized> {
    transport: &'a T,
    cache: &'a Cache,
}

impl<'a, T: Transport + ?Sized> Enricher<'a, T> {
    pub fn new(transport: &'a T, cache: &'a Cache) -> Self {
        Self { transport, cache }
    }

    /// Detail record for one commit, or `None` if it could not be fetched.
    pub fn enrich(&self, repository: &RepositoryId, summary: &CommitSummary) -> Option<CommitDetail> {
        match self.fetch(repository, summary) {
            DetailOutcome::Enriched(detail) => Some(detail),
            DetailOutcome::Dropped | DetailOutcome::RateLimited => None,
        }
    }

    pub fn fetch(&self, repository: &RepositoryId, summary: &CommitSummary) -> DetailOutcome {
        if let Some(detail) = self.cache.get_detail(repository, &summary.sha) {
            return DetailOutcome::Enriched(detail);
        }

        let claim = self.cache.claim_detail(repository, &summary.sha);
        let _held = claim.lock().unwrap_or_else(|e| e.into_inner());
        // another listing may have fetched it while we waited
        if let Some(detail) = self.cache.get_detail(repository, &summary.sha) {
            return DetailOutcome::Enriched(detail);
        }

        let body = match self.transport.request(&summary.detail_url, &[]) {
            Ok(ApiResponse::Success(body)) => body,
            Ok(ApiResponse::RateLimited) => return DetailOutcome::RateLimited,
            Ok(ApiResponse::HttpError(status)) => {
                warn!(%repository, sha = %summary.sha, status, "commit detail unavailable");
                return DetailOutcome::Dropped;
            }
            Err(e) => {
                warn!(%repository, sha = %summary.sha, error = %e, "commit detail request failed");
                return DetailOutcome::Dropped;
            }
        };

        match serde_json::from_value::<ApiCommit>(body) {
            Ok(raw) => {
                let detail = raw.into_detail(summary);
                self.cache.store_detail(repository, detail.clone());
                DetailOutcome::Enriched(detail)
            }
            Err(e) => {
                warn!(%repository, sha = %summary.sha, error = %e, "undecodable commit detail");
                DetailOutcome::Dropped
            }
        }
    }

    /// Enrich one page concurrently; returns once every fetch has settled.
    pub fn enrich_page(
        &self,
        repository: &RepositoryId,
        summaries: &[CommitSummary],
    ) -> PageEnrichment {
        let outcomes: Vec<DetailOutcome> = summaries
            .par_iter()
            .map(|summary| self.fetch(repository, summary))
            .collect();

        let mut page = PageEnrichment::default();
        for outcome in outcomes {
            match outcome {
                DetailOutcome::Enriched(detail) => page.details.push(detail),
                DetailOutcome::Dropped => page.dropped += 1,
                DetailOutcome::RateLimited => page.rate_limited += 1,
            }
        }
        debug!(
            %repository,
            enriched = page.details.len(),
            dropped = page.dropped,
            rate_limited = page.rate_limited,
            "page enriched"
        );
        page
    }
}

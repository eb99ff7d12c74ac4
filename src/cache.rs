use crate::github::Listing;
use crate::model::{CommitDetail, CommitSummary, RepositoryId};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

type ListingKey = (RepositoryId, Option<String>);
type DetailKey = (RepositoryId, String);

/// Caller-owned lookup tables that let repeated runs skip refetching.
///
/// Listings are keyed by `(repository, author)` and only complete listings
/// are stored, together with their `truncated` flag. Details are keyed by
/// `(repository, sha)`; enrichment is idempotent, so a stored detail is
/// always reusable.
#[derive(Debug, Default)]
pub struct Cache {
    listings: DashMap<ListingKey, Listing>,
    details: DashMap<DetailKey, CommitDetail>,
    claims: DashMap<DetailKey, Arc<Mutex<()>>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_listing(
        &self,
        repository: &RepositoryId,
        author: Option<&str>,
    ) -> Option<Listing> {
        self.listings
            .get(&(repository.clone(), author.map(str::to_string)))
            .map(|entry| entry.value().clone())
    }

    pub fn store_listing(
        &self,
        repository: &RepositoryId,
        author: Option<&str>,
        listing: Listing,
    ) {
        self.listings
            .insert((repository.clone(), author.map(str::to_string)), listing);
    }

    pub fn get_detail(&self, repository: &RepositoryId, sha: &str) -> Option<CommitDetail> {
        self.details
            .get(&(repository.clone(), sha.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn store_detail(&self, repository: &RepositoryId, detail: CommitDetail) {
        self.details
            .insert((repository.clone(), detail.summary.sha.clone()), detail);
    }

    /// Per-sha lock held while a detail is being fetched, so concurrent
    /// listings sharing a commit fetch it once.
    pub fn claim_detail(&self, repository: &RepositoryId, sha: &str) -> Arc<Mutex<()>> {
        self.claims
            .entry((repository.clone(), sha.to_string()))
            .or_default()
            .clone()
    }

    /// Shas from `summaries` that have no stored detail yet.
    pub fn missing_details<'a>(
        &self,
        repository: &RepositoryId,
        summaries: &'a [CommitSummary],
    ) -> Vec<&'a CommitSummary> {
        summaries
            .iter()
            .filter(|s| {
                !self
                    .details
                    .contains_key(&(repository.clone(), s.sha.clone()))
            })
            .collect()
    }

    /// Drop everything cached for one repository.
    pub fn invalidate(&self, repository: &RepositoryId) {
        self.listings.retain(|(repo, _), _| repo != repository);
        self.details.retain(|(repo, _), _| repo != repository);
        self.claims.retain(|(repo, _), _| repo != repository);
    }

    pub fn detail_count(&self) -> usize {
        self.details.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary(sha: &str) -> CommitSummary {
        CommitSummary {
            sha: sha.to_string(),
            author_login: None,
            author_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            message: "chore: x".to_string(),
            detail_url: format!("https://api.test/c/{sha}"),
        }
    }

    #[test]
    fn details_are_scoped_per_repository() {
        let cache = Cache::new();
        let widgets: RepositoryId = "acme/widgets".parse().unwrap();
        let gadgets: RepositoryId = "acme/gadgets".parse().unwrap();
        cache.store_detail(
            &widgets,
            CommitDetail {
                summary: summary("a"),
                files: vec![],
            },
        );
        assert!(cache.get_detail(&widgets, "a").is_some());
        assert!(cache.get_detail(&gadgets, "a").is_none());

        let summaries = vec![summary("a"), summary("b")];
        let missing: Vec<_> = cache
            .missing_details(&widgets, &summaries)
            .into_iter()
            .map(|s| s.sha.as_str())
            .collect();
        assert_eq!(missing, vec!["b"]);
    }

    #[test]
    fn listings_are_keyed_by_author_and_invalidated_per_repository() {
        let cache = Cache::new();
        let widgets: RepositoryId = "acme/widgets".parse().unwrap();
        cache.store_listing(
            &widgets,
            Some("octo"),
            Listing {
                summaries: vec![summary("a")],
                truncated: true,
            },
        );
        assert!(cache.get_listing(&widgets, None).is_none());
        let listing = cache.get_listing(&widgets, Some("octo")).unwrap();
        assert_eq!(listing.summaries.len(), 1);
        assert!(listing.truncated);
        cache.invalidate(&widgets);
        assert!(cache.get_listing(&widgets, Some("octo")).is_none());
    }

    #[test]
    fn claims_are_shared_per_sha() {
        let cache = Cache::new();
        let widgets: RepositoryId = "acme/widgets".parse().unwrap();
        let first = cache.claim_detail(&widgets, "a");
        let again = cache.claim_detail(&widgets, "a");
        let other = cache.claim_detail(&widgets, "b");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}

use super::transport::{ApiResponse, Transport};
use super::wire::ApiCommit;
use crate::error::{Result, ScopeError};
use crate::model::{CommitSummary, RepositoryId};
use crate::run::RunToken;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, warn};

pub const PAGE_SIZE: u32 = 100;
/// Hard ceiling on pages per listing (10 x 100 = 1000 items).
pub const MAX_PAGES: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub author: Option<String>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_author(login: impl Into<String>) -> Self {
        Self {
            author: Some(login.into()),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        self.author
            .iter()
            .map(|login| ("author", login.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub summaries: Vec<CommitSummary>,
    /// The page ceiling was reached while pages were still full.
    pub truncated: bool,
}

pub struct Paginator<'a, T: ?Sized> {
    transport: &'a T,
    page_size: u32,
    max_pages: u32,
}

impl<'a, T: Transport + ?Sized> Paginator<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            page_size: PAGE_SIZE,
            max_pages: MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.clamp(1, MAX_PAGES);
        self
    }

    /// Lazily walk `path` page by page. `label` names the resource in errors.
    pub fn pages<I: DeserializeOwned>(
        &self,
        label: impl Into<String>,
        path: impl Into<String>,
        params: Vec<(&'static str, String)>,
        run: &RunToken,
    ) -> Pages<'a, T, I> {
        Pages {
            transport: self.transport,
            label: label.into(),
            path: path.into(),
            params,
            page: 1,
            page_size: self.page_size,
            max_pages: self.max_pages,
            finished: false,
            truncated: false,
            run: run.clone(),
            _item: PhantomData,
        }
    }

    pub fn commits(
        &self,
        repository: &RepositoryId,
        query: &ListQuery,
        run: &RunToken,
    ) -> CommitPages<'a, T> {
        CommitPages {
            repository: repository.to_string(),
            inner: self.pages(
                repository.to_string(),
                format!("{}/commits", repository.api_path()),
                query.params(),
                run,
            ),
        }
    }

    /// Collect a whole listing. Any failure discards the pages already read.
    pub fn list_all(
        &self,
        repository: &RepositoryId,
        query: &ListQuery,
        run: &RunToken,
    ) -> Result<Listing> {
        let mut pages = self.commits(repository, query, run);
        let mut summaries = Vec::new();
        for page in pages.by_ref() {
            summaries.extend(page?);
        }
        Ok(Listing {
            summaries,
            truncated: pages.truncated(),
        })
    }
}

/// Page-number iterator over a JSON-array listing endpoint.
pub struct Pages<'a, T: ?Sized, I> {
    transport: &'a T,
    label: String,
    path: String,
    params: Vec<(&'static str, String)>,
    page: u32,
    page_size: u32,
    max_pages: u32,
    finished: bool,
    truncated: bool,
    run: RunToken,
    _item: PhantomData<I>,
}

impl<T: ?Sized, I> Pages<'_, T, I> {
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn fail(&mut self, err: ScopeError) -> Option<Result<Vec<I>>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<T: Transport + ?Sized, I: DeserializeOwned> Iterator for Pages<'_, T, I> {
    type Item = Result<Vec<I>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.run.is_current() {
            return self.fail(ScopeError::Superseded);
        }

        let mut params = self.params.clone();
        params.push(("per_page", self.page_size.to_string()));
        params.push(("page", self.page.to_string()));

        let body = match self.transport.request(&self.path, &params) {
            Ok(ApiResponse::Success(body)) => body,
            Ok(ApiResponse::RateLimited) => {
                warn!(resource = %self.label, page = self.page, "rate limited while paginating");
                return self.fail(ScopeError::RateLimitExceeded);
            }
            Ok(ApiResponse::HttpError(status)) => {
                return self.fail(ScopeError::Http { status });
            }
            Err(e) => return self.fail(e),
        };

        let items = match body {
            Value::Array(items) => items,
            other => {
                let kind = json_kind(&other);
                let label = self.label.clone();
                return self.fail(ScopeError::malformed(
                    label,
                    format!("expected a JSON array on page {}, got {kind}", self.page),
                ));
            }
        };

        if items.is_empty() {
            self.finished = true;
            return None;
        }

        let count = items.len();
        let parsed = items
            .into_iter()
            .map(serde_json::from_value::<I>)
            .collect::<std::result::Result<Vec<_>, _>>();
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                let label = self.label.clone();
                return self.fail(ScopeError::malformed(label, e.to_string()));
            }
        };
        debug!(resource = %self.label, page = self.page, count, "page fetched");

        if count < self.page_size as usize {
            self.finished = true;
        } else if self.page >= self.max_pages {
            if self.max_pages < MAX_PAGES {
                // caller asked for a bounded prefix; stopping here is expected
                debug!(resource = %self.label, pages = self.max_pages, "page limit reached");
            } else {
                warn!(
                    resource = %self.label,
                    pages = self.max_pages,
                    "page ceiling reached, listing truncated"
                );
            }
            self.finished = true;
            self.truncated = true;
        } else {
            self.page += 1;
        }
        Some(Ok(parsed))
    }
}

/// Commit listing pages converted into summaries.
pub struct CommitPages<'a, T: ?Sized> {
    repository: String,
    inner: Pages<'a, T, ApiCommit>,
}

impl<T: ?Sized> CommitPages<'_, T> {
    pub fn truncated(&self) -> bool {
        self.inner.truncated()
    }
}

impl<T: Transport + ?Sized> Iterator for CommitPages<'_, T> {
    type Item = Result<Vec<CommitSummary>>;

    fn next(&mut self) -> Option<Self::Item> {
        let page = self.inner.next()?;
        Some(page.and_then(|items| {
            items
                .into_iter()
                .map(|item| item.into_summary(&self.repository))
                .collect()
        }))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

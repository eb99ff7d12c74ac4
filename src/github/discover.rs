use super::paginate::Paginator;
use super::transport::{ApiResponse, Transport};
use super::wire::{ApiContributor, ApiRateLimit, ApiRepository, ApiTree};
use crate::classify::categorize;
use crate::error::{Result, ScopeError};
use crate::model::{Category, CategoryHistogram, RateLimitStatus, RepositoryId, TreeSummary};
use crate::run::RunToken;
use serde_json::Value;
use tracing::{debug, warn};

fn get<T: Transport + ?Sized>(transport: &T, path: &str, params: &[(&str, String)]) -> Result<Value> {
    match transport.request(path, params)? {
        ApiResponse::Success(body) => Ok(body),
        ApiResponse::RateLimited => Err(ScopeError::RateLimitExceeded),
        ApiResponse::HttpError(404) => Err(ScopeError::NotFound(path.to_string())),
        ApiResponse::HttpError(status) => Err(ScopeError::Http { status }),
    }
}

pub fn rate_limit<T: Transport + ?Sized>(transport: &T) -> Result<RateLimitStatus> {
    let body = get(transport, "/rate_limit", &[])?;
    let raw: ApiRateLimit = serde_json::from_value(body)
        .map_err(|e| ScopeError::malformed("rate_limit", e.to_string()))?;
    Ok(raw.into())
}

/// Repositories owned by a user or organization.
pub fn owner_repositories<T: Transport + ?Sized>(
    transport: &T,
    owner: &str,
    run: &RunToken,
) -> Result<Vec<RepositoryId>> {
    let pages = Paginator::new(transport).pages::<ApiRepository>(
        owner,
        format!("/users/{owner}/repos"),
        Vec::new(),
        run,
    );

    let mut repositories = Vec::new();
    for page in pages {
        let page = page.map_err(|e| match e {
            ScopeError::Http { status: 404 } => ScopeError::UnknownOwner(owner.to_string()),
            other => other,
        })?;
        for repo in page {
            match repo.full_name.parse::<RepositoryId>() {
                Ok(id) => repositories.push(id),
                Err(_) => warn!(owner, name = %repo.full_name, "skipping unparsable repository name"),
            }
        }
    }
    debug!(owner, count = repositories.len(), "repositories discovered");
    Ok(repositories)
}

/// Contributor logins ordered by contribution count, most active first.
pub fn contributors<T: Transport + ?Sized>(
    transport: &T,
    repository: &RepositoryId,
    run: &RunToken,
) -> Result<Vec<String>> {
    let pages = Paginator::new(transport).pages::<ApiContributor>(
        repository.to_string(),
        format!("{}/contributors", repository.api_path()),
        Vec::new(),
        run,
    );
    let mut all = Vec::new();
    for page in pages {
        all.extend(page?);
    }
    all.sort_by(|a, b| b.contributions.cmp(&a.contributions).then_with(|| a.login.cmp(&b.login)));
    Ok(all.into_iter().map(|c| c.login).collect())
}

/// Category mix of the files on the repository's default branch.
pub fn tree<T: Transport + ?Sized>(transport: &T, repository: &RepositoryId) -> Result<TreeSummary> {
    let repo_body = get(transport, &repository.api_path(), &[])?;
    let meta: ApiRepository = serde_json::from_value(repo_body)
        .map_err(|e| ScopeError::malformed(repository.to_string(), e.to_string()))?;
    let branch = meta
        .default_branch
        .ok_or_else(|| ScopeError::malformed(repository.to_string(), "no default branch"))?;

    let tree_body = get(
        transport,
        &format!("{}/git/trees/{branch}", repository.api_path()),
        &[("recursive", "1".to_string())],
    )?;
    let raw: ApiTree = serde_json::from_value(tree_body)
        .map_err(|e| ScopeError::malformed(repository.to_string(), e.to_string()))?;
    let entries = raw
        .tree
        .ok_or_else(|| ScopeError::malformed(repository.to_string(), "tree response has no tree field"))?;

    let mut categories: CategoryHistogram = Category::ALL.iter().map(|c| (*c, 0)).collect();
    let mut files = 0usize;
    for entry in entries.iter().filter(|e| e.kind == "blob") {
        files += 1;
        *categories.entry(categorize(&entry.path)).or_insert(0) += 1;
    }
    if raw.truncated {
        warn!(%repository, "upstream tree listing truncated");
    }

    Ok(TreeSummary {
        repository: repository.clone(),
        branch,
        files,
        categories,
        truncated: raw.truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::ScriptedTransport;
    use serde_json::json;

    fn repo() -> RepositoryId {
        "acme/widgets".parse().unwrap()
    }

    #[test]
    fn reads_rate_limit_snapshot() {
        let transport = ScriptedTransport::new().ok(
            "/rate_limit",
            json!({ "resources": { "core": { "limit": 60, "remaining": 12, "reset": 1710000000 } } }),
        );
        let status = rate_limit(&transport).unwrap();
        assert_eq!(status.limit, 60);
        assert_eq!(status.remaining, 12);
    }

    #[test]
    fn unknown_owner_is_a_typed_error() {
        let transport = ScriptedTransport::new();
        let err = owner_repositories(&transport, "nobody", &RunToken::detached()).unwrap_err();
        assert!(matches!(err, ScopeError::UnknownOwner(ref o) if o == "nobody"));
    }

    #[test]
    fn lists_owner_repositories() {
        let transport = ScriptedTransport::new().ok(
            "/users/acme/repos?page=1&per_page=100",
            json!([{ "full_name": "acme/widgets" }, { "full_name": "acme/gadgets" }]),
        );
        let repos = owner_repositories(&transport, "acme", &RunToken::detached()).unwrap();
        let names: Vec<_> = repos.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["acme/widgets", "acme/gadgets"]);
    }

    #[test]
    fn contributors_are_ordered_by_activity() {
        let transport = ScriptedTransport::new().ok(
            "/repos/acme/widgets/contributors?page=1&per_page=100",
            json!([
                { "login": "quiet", "contributions": 2 },
                { "login": "busy", "contributions": 40 }
            ]),
        );
        let logins = contributors(&transport, &repo(), &RunToken::detached()).unwrap();
        assert_eq!(logins, vec!["busy", "quiet"]);
    }

    #[test]
    fn tree_without_tree_field_is_malformed() {
        let transport = ScriptedTransport::new()
            .ok("/repos/acme/widgets", json!({ "full_name": "acme/widgets", "default_branch": "main" }))
            .ok("/repos/acme/widgets/git/trees/main?recursive=1", json!({ "sha": "abc" }));
        let err = tree(&transport, &repo()).unwrap_err();
        assert!(matches!(err, ScopeError::MalformedResponse { .. }));
    }

    #[test]
    fn tree_counts_blob_categories() {
        let transport = ScriptedTransport::new()
            .ok("/repos/acme/widgets", json!({ "full_name": "acme/widgets", "default_branch": "main" }))
            .ok(
                "/repos/acme/widgets/git/trees/main?recursive=1",
                json!({
                    "tree": [
                        { "path": "src", "type": "tree" },
                        { "path": "src/main.rs", "type": "blob" },
                        { "path": "web/app.tsx", "type": "blob" },
                        { "path": "README.md", "type": "blob" },
                        { "path": "Dockerfile", "type": "blob" }
                    ],
                    "truncated": false
                }),
            );
        let summary = tree(&transport, &repo()).unwrap();
        assert_eq!(summary.branch, "main");
        assert_eq!(summary.files, 4);
        assert_eq!(summary.categories[&Category::Backend], 1);
        assert_eq!(summary.categories[&Category::Frontend], 1);
        assert_eq!(summary.categories[&Category::Docs], 1);
        assert_eq!(summary.categories[&Category::Config], 0);
        assert_eq!(summary.categories[&Category::Other], 1);
    }
}

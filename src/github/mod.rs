pub mod discover;
pub mod enrich;
pub mod paginate;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use enrich::{DetailOutcome, Enricher, PageEnrichment};
pub use paginate::{ListQuery, Listing, Paginator, MAX_PAGES, PAGE_SIZE};
pub use transport::{ApiConfig, ApiResponse, HttpTransport, Transport};

//! Card repository: normalisation, durable cache and retrieval.

/// Durable single-slot cache of the canonical set.
pub mod cache;
/// Conversion of raw documents into canonical records.
pub mod normalize;
/// Remote document retrieval.
pub mod remote;
/// Shared in-memory canonical set.
pub mod store;

pub use cache::RepositoryCache;
pub use remote::{DocumentSource, HttpSource};
pub use store::{CacheStatus, CardRepository, RepositoryOrigin, RepositoryReport};

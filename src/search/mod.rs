//! Search collaborators.

pub mod duckduckgo;

pub use duckduckgo::DuckDuckGoSearch;

use crate::error::SearchError;
use crate::models::SearchHit;
use async_trait::async_trait;

/// A web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`. May return fewer than `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

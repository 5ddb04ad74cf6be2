//! Research stage: search, filter and fetch for every planned query.

use crate::error::{PipelineError, SearchError};
use crate::fetch::{DocumentFilter, FetchBatch, FetchPool, PageFetcher};
use crate::models::{FetchRequest, SearchQuery};
use crate::search::SearchProvider;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs the research stage.
pub struct Researcher {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    filter: DocumentFilter,
    results_per_query: usize,
    concurrency: usize,
    isolate_search_failures: bool,
}

impl Researcher {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        filter: DocumentFilter,
        results_per_query: usize,
        concurrency: usize,
        isolate_search_failures: bool,
    ) -> Self {
        Self {
            search,
            fetcher,
            filter,
            results_per_query,
            concurrency,
            isolate_search_failures,
        }
    }

    /// Search one query and keep the document-like hits.
    pub async fn candidates(&self, query: &str) -> Result<Vec<FetchRequest>, SearchError> {
        let hits = self.search.search(query, self.results_per_query).await?;
        let total = hits.len();
        let kept = self.filter.apply(hits);
        debug!(
            "Query '{}': {} hits, {} look like documents",
            query,
            total,
            kept.len()
        );

        Ok(kept
            .into_iter()
            .map(|hit| FetchRequest {
                query: query.to_string(),
                hit,
            })
            .collect())
    }

    /// Candidates for one query, honouring `isolate_search_failures`.
    ///
    /// `Ok(None)` means the query's search failed and was skipped.
    async fn query_requests(
        &self,
        query: &SearchQuery,
    ) -> Result<Option<Vec<FetchRequest>>, PipelineError> {
        match self.candidates(query).await {
            Ok(requests) => Ok(Some(requests)),
            Err(e) if self.isolate_search_failures => {
                warn!("Skipping query '{}': {}", query, e);
                Ok(None)
            }
            Err(source) => Err(PipelineError::Search {
                query: query.clone(),
                source,
            }),
        }
    }

    /// Everything `research` would fetch for `plan`, without fetching it.
    pub async fn pending_requests(
        &self,
        plan: &[SearchQuery],
    ) -> Result<Vec<FetchRequest>, PipelineError> {
        let mut pending = Vec::new();
        for query in plan {
            if let Some(requests) = self.query_requests(query).await? {
                pending.extend(requests);
            }
        }
        Ok(pending)
    }

    /// Research every query in plan order.
    ///
    /// Queries run one after another. Fetches within a query run concurrently
    /// under a single ceiling that is shared by the whole call.
    pub async fn research(&self, plan: &[SearchQuery]) -> Result<FetchBatch, PipelineError> {
        let pool = FetchPool::new(self.fetcher.clone(), self.concurrency);
        let mut aggregate = FetchBatch::default();
        debug!(
            "Researching {} queries, fetch ceiling {}",
            plan.len(),
            pool.concurrency()
        );

        for query in plan {
            let Some(requests) = self.query_requests(query).await? else {
                continue;
            };

            let batch = pool.run(requests).await;
            info!(
                "Query '{}': {} pages fetched, {} failed",
                query,
                batch.records.len(),
                batch.failures.len()
            );
            aggregate.extend(batch);
        }

        Ok(aggregate)
    }
}

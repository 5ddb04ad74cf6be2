//! Bounded concurrent fetch pool.
//!
//! Every request gets its own task. A task must hold a semaphore permit while
//! it fetches, so at most `concurrency` fetches are in flight. The permit is
//! dropped when the task ends on any path, including a panic.

use super::PageFetcher;
use crate::error::FetchError;
use crate::models::{FetchFailure, FetchRequest, ResearchRecord};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Outcome of one pool run. Both lists follow request order.
#[derive(Debug, Default)]
pub struct FetchBatch {
    pub records: Vec<ResearchRecord>,
    pub failures: Vec<FetchFailure>,
}

impl FetchBatch {
    /// Total number of requests accounted for.
    pub fn len(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another batch, keeping order.
    pub fn extend(&mut self, other: FetchBatch) {
        self.records.extend(other.records);
        self.failures.extend(other.failures);
    }
}

/// Runs page fetches under a fixed concurrency ceiling.
///
/// Cloning is cheap and clones share the same ceiling, so one pool built per
/// research run bounds the whole run.
#[derive(Clone)]
pub struct FetchPool {
    fetcher: Arc<dyn PageFetcher>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl FetchPool {
    /// Create a pool. A ceiling of zero is raised to one.
    pub fn new(fetcher: Arc<dyn PageFetcher>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            fetcher,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every request and wait for all of them.
    ///
    /// Never fails: each request ends up either as a record or as a failure.
    pub async fn run(&self, requests: Vec<FetchRequest>) -> FetchBatch {
        debug!(
            "Fetching {} pages (ceiling {})",
            requests.len(),
            self.concurrency
        );

        let mut tasks = Vec::with_capacity(requests.len());
        for request in requests {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();
            let href = request.hit.href.clone();

            let task = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FetchError::TaskFailed(e.to_string()))?;
                let content = fetcher.fetch(&request.hit.href).await?;
                Ok::<_, FetchError>(ResearchRecord::from_hit(&request.hit, content))
            });

            tasks.push((request.query, href, task));
        }

        let mut batch = FetchBatch::default();
        for (query, href, task) in tasks {
            let outcome = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(FetchError::TaskFailed(join_error.to_string())),
            };

            match outcome {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    warn!("Failed to fetch {} for '{}': {}", href, query, error);
                    batch.failures.push(FetchFailure { query, href, error });
                }
            }
        }

        batch
    }
}

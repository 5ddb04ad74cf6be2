//! Pipeline orchestration.
//!
//! A run walks `Start -> Planned -> Researched -> Summarized -> End` exactly
//! once. Each stage runs to completion before the next one starts, and the
//! first stage error ends the run with no partial summary.

use super::{QueryPlanner, Researcher, Summarizer};
use crate::config::Config;
use crate::error::PipelineError;
use crate::fetch::{DocumentFilter, PageFetcher};
use crate::llm::LanguageModel;
use crate::models::{FetchFailure, FetchRequest, SearchQuery, WorkflowStage, WorkflowState};
use crate::search::SearchProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Tunables of a workflow, taken from [`Config`].
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub max_queries: usize,
    pub results_per_query: usize,
    pub document_suffixes: Vec<String>,
    pub concurrency: usize,
    pub isolate_search_failures: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_queries: config.research.max_queries,
            results_per_query: config.research.results_per_query,
            document_suffixes: config.research.document_suffixes.clone(),
            concurrency: config.fetch.concurrency,
            isolate_search_failures: config.research.isolate_search_failures,
        }
    }
}

/// A finished run plus the fetches that were dropped along the way.
#[derive(Debug)]
pub struct WorkflowRun {
    pub state: WorkflowState,
    pub failures: Vec<FetchFailure>,
}

/// Planned queries and the pages a full run would fetch for them.
#[derive(Debug, Default)]
pub struct ResearchPreview {
    pub plan: Vec<SearchQuery>,
    pub requests: Vec<FetchRequest>,
}

/// Drives one topic through planning, research and summarization.
///
/// Holds only stateless collaborators; every run gets its own
/// [`WorkflowState`] and fetch pool, so one workflow can serve many runs.
pub struct ResearchWorkflow {
    planner: QueryPlanner,
    researcher: Researcher,
    summarizer: Summarizer,
}

impl ResearchWorkflow {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            planner: QueryPlanner::new(model.clone(), settings.max_queries),
            researcher: Researcher::new(
                search,
                fetcher,
                DocumentFilter::new(&settings.document_suffixes),
                settings.results_per_query,
                settings.concurrency,
                settings.isolate_search_failures,
            ),
            summarizer: Summarizer::new(model),
        }
    }

    /// Run the full pipeline and return the final state.
    pub async fn run(&self, topic: &str) -> Result<WorkflowState, PipelineError> {
        Ok(self.run_detailed(topic).await?.state)
    }

    /// Run the full pipeline, keeping the list of failed fetches.
    pub async fn run_detailed(&self, topic: &str) -> Result<WorkflowRun, PipelineError> {
        self.run_observed(topic, &|_, _| {}).await
    }

    /// Run the full pipeline, calling `observer` before each stage starts.
    pub async fn run_observed(
        &self,
        topic: &str,
        observer: &(dyn Fn(WorkflowStage, &WorkflowState) + Send + Sync),
    ) -> Result<WorkflowRun, PipelineError> {
        info!("Starting research workflow for '{}'", topic);

        let mut state = WorkflowState::new(topic);
        let mut failures = Vec::new();
        let mut stage = WorkflowStage::Start;

        while stage != WorkflowStage::End {
            observer(stage, &state);

            match stage {
                WorkflowStage::Start => {
                    state.plan = self.planner.plan(&state.topic).await?;
                }
                WorkflowStage::Planned => {
                    let batch = self.researcher.research(&state.plan).await?;
                    state.research_data = batch.records;
                    failures = batch.failures;
                }
                WorkflowStage::Researched => {
                    state.summary = self.summarizer.summarize(&state.research_data).await?;
                }
                WorkflowStage::Summarized | WorkflowStage::End => {}
            }

            let next = stage.next();
            info!("Workflow stage {} -> {}", stage, next);
            stage = next;
        }

        if !failures.is_empty() {
            warn!("{} pages could not be fetched", failures.len());
        }

        Ok(WorkflowRun { state, failures })
    }

    /// Plan and search without fetching or summarizing.
    pub async fn preview(&self, topic: &str) -> Result<ResearchPreview, PipelineError> {
        let plan = self.planner.plan(topic).await?;
        let requests = self.researcher.pending_requests(&plan).await?;

        Ok(ResearchPreview { plan, requests })
    }
}

//! Query planning stage.

use crate::error::PipelineError;
use crate::llm::{generate_structured, LanguageModel};
use crate::models::{PlannerResult, SearchQuery};
use std::sync::Arc;
use tracing::{debug, info};

/// Turns a topic into a short list of search queries with one structured
/// model call.
pub struct QueryPlanner {
    model: Arc<dyn LanguageModel>,
    max_queries: usize,
}

impl QueryPlanner {
    pub fn new(model: Arc<dyn LanguageModel>, max_queries: usize) -> Self {
        Self { model, max_queries }
    }

    /// Plan search queries for `topic`. An empty plan is not an error.
    pub async fn plan(&self, topic: &str) -> Result<Vec<SearchQuery>, PipelineError> {
        debug!("Planning search queries for '{}'", topic);

        let result: PlannerResult = generate_structured(
            self.model.as_ref(),
            PLANNER_SYSTEM_PROMPT,
            topic,
            &PlannerResult::schema(),
        )
        .await
        .map_err(PipelineError::Planning)?;

        let queries = result.into_queries(self.max_queries);
        info!("Search queries: {:?}", queries);
        Ok(queries)
    }
}

const PLANNER_SYSTEM_PROMPT: &str = r#"You are an expert research planner specializing in crafting optimal search queries. Your task is to generate the most effective search queries to comprehensively research the given topic. Consider these guidelines:

1. Create queries that will yield diverse, high-quality information sources
2. Use specific keywords and phrases that precisely target the topic
3. Include both broad and narrow focus queries to capture different aspects
4. Structure queries to avoid bias and ensure balanced coverage
5. Limit to a maximum of 5 queries that together provide complete coverage

Return only the most essential queries that will produce the most valuable research results.

Respond with a JSON object of the form {"search_queries": ["...", "..."]}."#;

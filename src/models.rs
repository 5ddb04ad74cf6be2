//! Data models for the research pipeline.
//!
//! This module contains the records threaded through the pipeline stages
//! and the report structures built from a finished run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// A single search query produced by the planner.
pub type SearchQuery = String;

/// Text body of a fetched page.
pub type PageContent = String;

/// A candidate result returned by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub href: String,
    pub snippet: String,
}

/// A successfully fetched page, tagged with its source metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub title: String,
    pub href: String,
    pub content: String,
}

impl ResearchRecord {
    /// Build a record from the hit it was fetched for.
    pub fn from_hit(hit: &SearchHit, content: PageContent) -> Self {
        Self {
            title: hit.title.clone(),
            href: hit.href.clone(),
            content,
        }
    }
}

/// One unit of work for the fetch pool.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Query the hit was found for.
    pub query: SearchQuery,
    pub hit: SearchHit,
}

/// A fetch that did not produce a record.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub query: SearchQuery,
    pub href: String,
    pub error: crate::error::FetchError,
}

/// Structured output expected from the planner's model call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerResult {
    #[serde(default)]
    pub search_queries: Vec<SearchQuery>,
}

impl PlannerResult {
    /// JSON schema handed to the model for constrained generation.
    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "search_queries": {
                    "type": "array",
                    "description": "The search queries to research",
                    "items": { "type": "string" }
                }
            },
            "required": ["search_queries"]
        })
    }

    /// Trim entries, drop blank ones and cap the list at `max_queries`.
    pub fn into_queries(self, max_queries: usize) -> Vec<SearchQuery> {
        self.search_queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(max_queries)
            .collect()
    }
}

/// Position of a run in the fixed plan -> research -> summarize sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Start,
    Planned,
    Researched,
    Summarized,
    End,
}

impl WorkflowStage {
    /// The stage that follows this one. `End` is terminal.
    pub fn next(self) -> Self {
        match self {
            WorkflowStage::Start => WorkflowStage::Planned,
            WorkflowStage::Planned => WorkflowStage::Researched,
            WorkflowStage::Researched => WorkflowStage::Summarized,
            WorkflowStage::Summarized | WorkflowStage::End => WorkflowStage::End,
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStage::Start => write!(f, "start"),
            WorkflowStage::Planned => write!(f, "planned"),
            WorkflowStage::Researched => write!(f, "researched"),
            WorkflowStage::Summarized => write!(f, "summarized"),
            WorkflowStage::End => write!(f, "end"),
        }
    }
}

/// The mutable aggregate threaded through every stage of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// The topic to research.
    pub topic: String,
    /// Queries produced by the planner.
    pub plan: Vec<SearchQuery>,
    /// Pages fetched by the researcher, in plan order.
    pub research_data: Vec<ResearchRecord>,
    /// Markdown summary; empty until the summarizer finishes.
    pub summary: String,
}

impl WorkflowState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

/// Metadata about a research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Topic that was researched.
    pub topic: String,
    /// Date and time the run finished.
    pub generated_at: DateTime<Utc>,
    /// Provider and model used, e.g. `ollama/llama3.2:latest`.
    pub model_used: String,
    /// Number of planned queries.
    pub queries: usize,
    /// Number of pages that made it into the corpus.
    pub sources: usize,
    /// Number of fetches that failed.
    pub failed_fetches: usize,
    /// Total corpus size in bytes.
    pub corpus_bytes: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// A source listed in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSource {
    pub title: String,
    pub href: String,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A page that was found but could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFailure {
    pub query: SearchQuery,
    pub href: String,
    pub error: String,
}

impl From<&FetchFailure> for ReportFailure {
    fn from(failure: &FetchFailure) -> Self {
        Self {
            query: failure.query.clone(),
            href: failure.href.clone(),
            error: failure.error.to_string(),
        }
    }
}

/// The complete research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub metadata: ReportMetadata,
    pub plan: Vec<SearchQuery>,
    pub summary: String,
    pub sources: Vec<ReportSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ReportFailure>,
}

impl ResearchReport {
    /// Build a report from a finished workflow state.
    pub fn from_state(
        state: &WorkflowState,
        failures: &[FetchFailure],
        metadata: ReportMetadata,
        include_content: bool,
    ) -> Self {
        let sources = state
            .research_data
            .iter()
            .map(|record| ReportSource {
                title: record.title.clone(),
                href: record.href.clone(),
                bytes: record.content.len(),
                content: include_content.then(|| record.content.clone()),
            })
            .collect();

        Self {
            metadata,
            plan: state.plan.clone(),
            summary: state.summary.clone(),
            sources,
            failures: failures.iter().map(ReportFailure::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = WorkflowStage::Start;
        let mut seen = vec![stage];
        while stage != WorkflowStage::End {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                WorkflowStage::Start,
                WorkflowStage::Planned,
                WorkflowStage::Researched,
                WorkflowStage::Summarized,
                WorkflowStage::End,
            ]
        );
        assert_eq!(WorkflowStage::End.next(), WorkflowStage::End);
    }

    #[test]
    fn test_planner_result_cleanup() {
        let result = PlannerResult {
            search_queries: vec![
                "  Japan GDP 2024 ".to_string(),
                "".to_string(),
                "   ".to_string(),
                "Japan economic policy".to_string(),
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "d".to_string(),
            ],
        };
        let queries = result.into_queries(5);
        assert_eq!(
            queries,
            vec!["Japan GDP 2024", "Japan economic policy", "a", "b", "c"]
        );
    }

    #[test]
    fn test_planner_result_missing_field_defaults() {
        let parsed: PlannerResult = serde_json::from_str("{}").unwrap();
        assert!(parsed.search_queries.is_empty());
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = WorkflowState::new("Japanese economics");
        assert_eq!(state.topic, "Japanese economics");
        assert!(state.plan.is_empty());
        assert!(state.research_data.is_empty());
        assert!(state.summary.is_empty());
    }

    #[test]
    fn test_report_from_state() {
        let state = WorkflowState {
            topic: "t".to_string(),
            plan: vec!["q".to_string()],
            research_data: vec![ResearchRecord {
                title: "Page".to_string(),
                href: "https://example.com/a.html".to_string(),
                content: "hello".to_string(),
            }],
            summary: "# t".to_string(),
        };
        let metadata = ReportMetadata {
            topic: "t".to_string(),
            generated_at: Utc::now(),
            model_used: "ollama/test".to_string(),
            queries: 1,
            sources: 1,
            failed_fetches: 0,
            corpus_bytes: 5,
            duration_seconds: 1.0,
        };

        let report = ResearchReport::from_state(&state, &[], metadata.clone(), false);
        assert_eq!(report.sources[0].bytes, 5);
        assert!(report.sources[0].content.is_none());
        assert!(report.failures.is_empty());

        let failures = vec![FetchFailure {
            query: "q".to_string(),
            href: "https://example.com/b.html".to_string(),
            error: crate::error::FetchError::Status(404),
        }];
        let report = ResearchReport::from_state(&state, &failures, metadata, true);
        assert_eq!(report.sources[0].content.as_deref(), Some("hello"));
        assert_eq!(report.failures[0].query, "q");
        assert_eq!(report.failures[0].href, "https://example.com/b.html");
        assert_eq!(report.failures[0].error, "server returned HTTP 404");
    }
}

//! Typed errors for the research pipeline.
//!
//! Only [`FetchError`] is isolated (per page, inside the fetch pool). Every
//! other error aborts the run and surfaces as a [`PipelineError`].

use thiserror::Error;

/// Failure to fetch a single page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("response is not text (content-type: {0})")]
    NotText(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The fetch task itself died (panic or runtime shutdown).
    #[error("fetch task failed: {0}")]
    TaskFailed(String),
}

/// Failure of the search collaborator for one query.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search provider returned HTTP {0}")]
    Status(u16),

    #[error("failed to parse search results: {0}")]
    Parse(String),
}

/// Failure of a language-model call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("cannot connect to model endpoint at {0}")]
    Connect(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model request failed: {0}")]
    Request(String),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("model returned invalid structured output: {0}")]
    InvalidJson(String),

    #[error("model blocked the prompt: {0}")]
    Blocked(String),
}

/// The single error type a pipeline run can return.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("planning failed: {0}")]
    Planning(#[source] LlmError),

    #[error("search failed for query '{query}': {source}")]
    Search {
        query: String,
        #[source]
        source: SearchError,
    },

    #[error("summarization failed: {0}")]
    Summarization(#[source] LlmError),
}

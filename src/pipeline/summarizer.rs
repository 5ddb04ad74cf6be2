//! Summarization stage.

use crate::error::{LlmError, PipelineError};
use crate::llm::LanguageModel;
use crate::models::ResearchRecord;
use std::sync::Arc;
use tracing::{debug, info};

/// Join records into the plain-text corpus handed to the model.
///
/// Each record renders as `title\nhref\ncontent`; records are separated by a
/// single newline.
pub fn build_corpus(records: &[ResearchRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}\n{}\n{}", r.title, r.href, r.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Synthesizes fetched pages into a markdown summary.
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// One free-text model call over the whole corpus. An empty corpus is
    /// still sent.
    pub async fn summarize(&self, records: &[ResearchRecord]) -> Result<String, PipelineError> {
        let corpus = build_corpus(records);
        debug!(
            "Summarizing {} records ({} bytes)",
            records.len(),
            corpus.len()
        );

        let summary = self
            .model
            .generate_text(SUMMARIZER_SYSTEM_PROMPT, &corpus)
            .await
            .map_err(PipelineError::Summarization)?;

        if summary.trim().is_empty() {
            return Err(PipelineError::Summarization(LlmError::EmptyResponse));
        }

        info!("Summary generated ({} bytes)", summary.len());
        Ok(summary)
    }
}

const SUMMARIZER_SYSTEM_PROMPT: &str = r#"You are an expert research summarizer. Your task is to analyze and synthesize multiple research sources into a clear, concise, and well-structured summary. Follow these guidelines:

1. Focus on key insights, main points, and important findings
2. Maintain accuracy and preserve the original meaning
3. Organize information logically with clear headings
4. Use bullet points for key takeaways
5. Include relevant statistics and data points when available
6. Highlight any notable trends, patterns, or contradictions
7. Keep the language professional yet accessible
8. Ensure the summary is comprehensive but concise

Format the output in markdown with the following structure:
# [Main Topic]
## Key Insights
- [Insight 1]
- [Insight 2]
## Detailed Findings
### [Sub-topic 1]
[Summary content]
### [Sub-topic 2]
[Summary content]
## Conclusion
[Overall synthesis and final thoughts]"#;

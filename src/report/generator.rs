//! Markdown and JSON report generation.
//!
//! Renders a [`ResearchReport`] for humans (markdown) or tools (JSON).

use crate::analysis::{format_bytes, group_by_domain, largest_sources};
use crate::models::{ReportFailure, ReportMetadata, ReportSource, ResearchReport, SearchQuery};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
///
/// The summary is embedded verbatim. `include_sources` controls the sources
/// section.
pub fn generate_markdown_report(report: &ResearchReport, include_sources: bool) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Research Report: {}\n\n", report.metadata.topic));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, include_sources));
    output.push_str(&generate_plan_section(&report.plan));
    output.push_str(&generate_summary_section(&report.summary));

    if include_sources {
        output.push_str(&generate_sources_section(&report.sources));
        output.push_str(&generate_failures_section(&report.failures));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Topic:** {}\n", metadata.topic));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Used:** `{}`\n", metadata.model_used));
    section.push_str(&format!("- **Search Queries:** {}\n", metadata.queries));
    section.push_str(&format!("- **Sources Read:** {}\n", metadata.sources));
    if metadata.failed_fetches > 0 {
        section.push_str(&format!(
            "- **Failed Fetches:** {}\n",
            metadata.failed_fetches
        ));
    }
    section.push_str(&format!(
        "- **Corpus Size:** {}\n",
        format_bytes(metadata.corpus_bytes)
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &ResearchReport, include_sources: bool) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Search Plan](#search-plan)\n");
    toc.push_str("- [Summary](#summary)\n");
    if include_sources && !report.sources.is_empty() {
        toc.push_str("- [Sources](#sources)\n");
    }
    if include_sources && !report.failures.is_empty() {
        toc.push_str("- [Failed Fetches](#failed-fetches)\n");
    }
    toc.push('\n');

    toc
}

fn generate_plan_section(plan: &[SearchQuery]) -> String {
    let mut section = String::new();

    section.push_str("## Search Plan\n\n");
    if plan.is_empty() {
        section.push_str("The planner produced no search queries.\n\n");
        return section;
    }

    for (i, query) in plan.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, query));
    }
    section.push('\n');

    section
}

fn generate_summary_section(summary: &str) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(summary.trim_end());
    section.push_str("\n\n");

    section
}

fn generate_sources_section(sources: &[ReportSource]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Sources\n\n");

    for (domain, domain_sources) in group_by_domain(sources) {
        section.push_str(&format!("### {}\n\n", domain));
        for source in domain_sources {
            section.push_str(&format!(
                "- [{}]({}) ({})\n",
                escape_link_text(&source.title),
                source.href,
                format_bytes(source.bytes)
            ));
        }
        section.push('\n');
    }

    let largest = largest_sources(sources, 5);
    if sources.len() > 1 {
        section.push_str("### Largest Sources\n\n");
        section.push_str("| Source | Size |\n");
        section.push_str("|:---|---:|\n");
        for source in largest {
            section.push_str(&format!(
                "| {} | {} |\n",
                source.href,
                format_bytes(source.bytes)
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_failures_section(failures: &[ReportFailure]) -> String {
    if failures.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Failed Fetches\n\n");
    section.push_str("| Page | Query | Error |\n");
    section.push_str("|:---|:---|:---|\n");
    for failure in failures {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            failure.href,
            failure.query.replace('|', "\\|"),
            failure.error.replace('|', "\\|")
        ));
    }
    section.push('\n');

    section
}

/// Square brackets would end the link text early.
fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by webscribe v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &ResearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

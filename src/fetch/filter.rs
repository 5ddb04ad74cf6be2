//! Document-suffix heuristic for search hits.
//!
//! Only hits whose URL path ends in one of the configured suffixes are
//! fetched. This is a coarse filter to skip PDFs and images, not a
//! content-type check.

use crate::models::SearchHit;
use url::Url;

/// Filters search hits down to document-like pages.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    /// Lowercased suffixes without a leading dot (e.g. `["html"]`)
    suffixes: Vec<String>,
}

impl Default for DocumentFilter {
    fn default() -> Self {
        Self::new(&["html".to_string()])
    }
}

impl DocumentFilter {
    pub fn new(suffixes: &[String]) -> Self {
        Self {
            suffixes: suffixes
                .iter()
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Check if a URL looks like a document page.
    pub fn matches(&self, url: &str) -> bool {
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_lowercase(),
            Err(_) => strip_query(url).to_lowercase(),
        };
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    /// Keep the hits that pass, preserving order.
    pub fn apply(&self, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        hits.into_iter().filter(|hit| self.matches(&hit.href)).collect()
    }
}

/// Href without query string or fragment, for hrefs `Url` rejects.
fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

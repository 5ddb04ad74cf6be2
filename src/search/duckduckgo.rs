//! DuckDuckGo HTML search.
//!
//! Scrapes the no-JavaScript results page. Result anchors carry the title
//! and a `uddg=` redirect to the real URL; snippets are matched by position.

use super::SearchProvider;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::models::SearchHit;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

/// Search provider backed by html.duckduckgo.com.
pub struct DuckDuckGoSearch {
    http_client: reqwest::Client,
    endpoint: String,
    region: Option<String>,
    title_re: Regex,
    snippet_re: Regex,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            title_re: Regex::new(r#"class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
                .context("invalid title pattern")?,
            snippet_re: Regex::new(r#"class="result__snippet"[^>]*>(.*?)</a>"#)
                .context("invalid snippet pattern")?,
        })
    }

    /// Extract hits from a results page.
    fn parse_results(&self, html: &str, max_results: usize) -> Vec<SearchHit> {
        let snippets: Vec<String> = self
            .snippet_re
            .captures_iter(html)
            .filter_map(|cap| cap.get(1).map(|m| clean_text(m.as_str())))
            .collect();

        self.title_re
            .captures_iter(html)
            .enumerate()
            .filter_map(|(i, cap)| {
                let href = resolve_redirect(cap.get(1)?.as_str());
                let title = clean_text(cap.get(2)?.as_str());
                if title.is_empty() || href.is_empty() {
                    return None;
                }
                Some(SearchHit {
                    title,
                    href,
                    snippet: snippets.get(i).cloned().unwrap_or_default(),
                })
            })
            .take(max_results)
            .collect()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(ref region) = self.region {
            params.push(("kl", region.clone()));
        }

        debug!("Searching DuckDuckGo for '{}'", query);

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let hits = self.parse_results(&html, max_results);
        debug!("Query '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }
}

/// Unwrap DuckDuckGo's `/l/?uddg=<encoded>` redirect links.
fn resolve_redirect(href: &str) -> String {
    let href = decode_entities(href);
    let target = href
        .split("uddg=")
        .nth(1)
        .map(|rest| rest.split('&').next().unwrap_or(rest))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned());

    match target {
        Some(url) => url,
        None if href.starts_with("//") => format!("https:{}", href),
        None => href,
    }
}

/// Strip inline tags and decode entities.
fn clean_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    decode_entities(text.trim())
}

/// Basic HTML entity decoding
fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

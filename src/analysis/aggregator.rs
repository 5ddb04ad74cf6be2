//! Corpus aggregation and statistics.
//!
//! Utilities for summarizing the fetched corpus: sizes, per-domain counts
//! and the largest sources.

use crate::models::{ReportSource, ResearchRecord};
use std::collections::BTreeMap;
use url::Url;

/// Summary statistics for a fetched corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    /// Number of records.
    pub records: usize,
    /// Sum of content sizes in bytes.
    pub total_bytes: usize,
    /// Record count per domain.
    pub by_domain: BTreeMap<String, usize>,
}

impl CorpusStats {
    pub fn from_records(records: &[ResearchRecord]) -> Self {
        let mut by_domain: BTreeMap<String, usize> = BTreeMap::new();
        for record in records {
            *by_domain.entry(domain_of(&record.href)).or_default() += 1;
        }

        Self {
            records: records.len(),
            total_bytes: records.iter().map(|r| r.content.len()).sum(),
            by_domain,
        }
    }

    /// Number of distinct domains.
    pub fn domain_count(&self) -> usize {
        self.by_domain.len()
    }
}

/// Host part of a URL, lowercased and without a leading `www.`.
pub fn domain_of(href: &str) -> String {
    let host = match Url::parse(href) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_lowercase(),
            None => fallback_host(href),
        },
        Err(_) => fallback_host(href),
    };

    match host.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => host,
    }
}

/// Best-effort host for hrefs `Url` rejects, such as scheme-less ones.
fn fallback_host(href: &str) -> String {
    let rest = href.split_once("://").map(|(_, r)| r).unwrap_or(href);
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .rsplit('@')
        .next()
        .unwrap_or("");
    host.split(':').next().unwrap_or("").to_lowercase()
}

/// Group report sources by domain. Order within a domain is kept.
pub fn group_by_domain(sources: &[ReportSource]) -> BTreeMap<String, Vec<&ReportSource>> {
    let mut grouped: BTreeMap<String, Vec<&ReportSource>> = BTreeMap::new();

    for source in sources {
        grouped.entry(domain_of(&source.href)).or_default().push(source);
    }

    grouped
}

/// The `n` largest sources by size, largest first.
pub fn largest_sources(sources: &[ReportSource], n: usize) -> Vec<&ReportSource> {
    let mut sorted: Vec<&ReportSource> = sources.iter().collect();
    sorted.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.href.cmp(&b.href)));
    sorted.truncate(n);
    sorted
}

/// Render a byte count for humans.
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(href: &str, content: &str) -> ResearchRecord {
        ResearchRecord {
            title: href.to_string(),
            href: href.to_string(),
            content: content.to_string(),
        }
    }

    fn source(href: &str, bytes: usize) -> ReportSource {
        ReportSource {
            title: href.to_string(),
            href: href.to_string(),
            bytes,
            content: None,
        }
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.Example.com/a.html"), "example.com");
        assert_eq!(domain_of("http://stats.example.org:8080/x?y=1"), "stats.example.org");
        assert_eq!(domain_of("https://user@host.example/#frag"), "host.example");
        assert_eq!(domain_of("example.net/page.html"), "example.net");
        assert_eq!(domain_of("http://[2001:db8::1]:8080/a.html"), "[2001:db8::1]");
        assert_eq!(domain_of("https://WWW.gov.example:443/p?q=a:b"), "gov.example");
    }

    #[test]
    fn test_corpus_stats() {
        let stats = CorpusStats::from_records(&[
            record("https://a.example/1.html", "abc"),
            record("https://www.a.example/2.html", "de"),
            record("https://b.example/3.html", ""),
        ]);

        assert_eq!(stats.records, 3);
        assert_eq!(stats.total_bytes, 5);
        assert_eq!(stats.domain_count(), 2);
        assert_eq!(stats.by_domain["a.example"], 2);
        assert_eq!(CorpusStats::from_records(&[]), CorpusStats::default());
    }

    #[test]
    fn test_group_and_largest() {
        let sources = vec![
            source("https://b.example/1.html", 10),
            source("https://a.example/2.html", 300),
            source("https://b.example/3.html", 50),
        ];

        let grouped = group_by_domain(&sources);
        let domains: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(domains, vec!["a.example", "b.example"]);
        assert_eq!(grouped["b.example"][0].href, "https://b.example/1.html");

        let largest = largest_sources(&sources, 2);
        assert_eq!(largest[0].bytes, 300);
        assert_eq!(largest[1].bytes, 50);
        assert!(largest_sources(&[], 3).is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}

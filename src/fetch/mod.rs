//! Page fetching.
//!
//! A [`PageFetcher`] turns one URL into page text or a typed [`FetchError`].
//! Errors never escape as panics or transport exceptions, so the pool can
//! treat every failure as data.

pub mod filter;
pub mod pool;

pub use filter::DocumentFilter;
pub use pool::{FetchBatch, FetchPool};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::PageContent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Line width used when rendering HTML as plain text.
const TEXT_WIDTH: usize = 100;

/// Fetches a single page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

/// reqwest-backed fetcher. One GET per call, no retry.
pub struct HttpPageFetcher {
    http_client: reqwest::Client,
    timeout_seconds: u64,
    extract_text: bool,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            timeout_seconds: config.timeout_seconds,
            extract_text: config.extract_text,
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_seconds)
        } else {
            FetchError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        debug!("Fetching {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        // A missing content-type is accepted
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_textual(content_type) {
                return Err(FetchError::NotText(content_type.to_string()));
            }
        }

        // Decoded with the charset the server declares, UTF-8 otherwise
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_seconds)
            } else {
                FetchError::Decode(e.to_string())
            }
        })?;

        let content = if self.extract_text {
            html2text::from_read(body.as_bytes(), TEXT_WIDTH)
        } else {
            body
        };

        debug!("Fetched {} ({} bytes)", url, content.len());
        Ok(content)
    }
}

/// Whether a content-type header denotes a text body.
fn is_textual(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();

    mime.starts_with("text/")
        || mime.ends_with("+xml")
        || mime.ends_with("/xml")
        || mime.ends_with("/json")
        || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn fetcher(extract_text: bool) -> HttpPageFetcher {
        let config = FetchConfig {
            timeout_seconds: 5,
            extract_text,
            ..FetchConfig::default()
        };
        HttpPageFetcher::new(&config).unwrap()
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual("text/html; charset=utf-8"));
        assert!(is_textual("TEXT/PLAIN"));
        assert!(is_textual("application/xhtml+xml"));
        assert!(is_textual("application/json"));
        assert!(!is_textual("application/pdf"));
        assert!(!is_textual("image/png"));
    }

    #[tokio::test]
    async fn test_fetch_html() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/page.html")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html><body><p>Japan GDP grew.</p></body></html>")
            .create_async()
            .await;

        let url = format!("{}/page.html", server.url());
        let body = fetcher(false).fetch(&url).await.unwrap();

        assert!(body.contains("<p>Japan GDP grew.</p>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_extracts_text() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/page.html")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><p>Plain words</p></body></html>")
            .create_async()
            .await;

        let url = format!("{}/page.html", server.url());
        let body = fetcher(true).fetch(&url).await.unwrap();

        assert!(body.contains("Plain words"));
        assert!(!body.contains("<p>"));
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.html")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing.html", server.url());
        let err = fetcher(false).fetch(&url).await.unwrap_err();
        assert_eq!(err, FetchError::Status(404));
    }

    #[tokio::test]
    async fn test_fetch_rejects_binary() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/file.html")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let url = format!("{}/file.html", server.url());
        let err = fetcher(false).fetch(&url).await.unwrap_err();
        assert_eq!(err, FetchError::NotText("application/pdf".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_decodes_declared_charset() {
        let mut server = Server::new_async().await;
        // "日本" in Shift_JIS
        let _mock = server
            .mock("GET", "/nihon.html")
            .with_status(200)
            .with_header("content-type", "text/html; charset=shift_jis")
            .with_body(vec![0x93, 0xFA, 0x96, 0x7B])
            .create_async()
            .await;

        let url = format!("{}/nihon.html", server.url());
        let body = fetcher(false).fetch(&url).await.unwrap();
        assert_eq!(body, "日本");
    }

    #[tokio::test]
    async fn test_fetch_slow_page_times_out() {
        // Bound but never accepted: the request is sent and no reply comes back
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = FetchConfig {
            timeout_seconds: 1,
            ..FetchConfig::default()
        };
        let err = HttpPageFetcher::new(&config)
            .unwrap()
            .fetch(&format!("http://{}/slow.html", addr))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Timeout(1));
        drop(listener);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Port 9 (discard) is closed on test hosts
        let err = fetcher(false)
            .fetch("http://127.0.0.1:9/page.html")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request(_) | FetchError::Timeout(_)));
    }
}

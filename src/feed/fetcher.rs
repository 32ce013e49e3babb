use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::feed::parser::{parse_feed, RawEntry};

/// Errors that can occur while retrieving or parsing one feed document.
///
/// Every variant is feed-level: the orchestrator logs it and counts the feed
/// as zero for this run. The next run retries naturally.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request or body read exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Feed document could not be parsed as RSS, Atom or JSON Feed
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the size limit
    #[error("Response too large (limit {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

impl FetchError {
    /// Whether the document was retrieved but could not be understood
    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }
}

/// Retrieves one feed and returns its entries in document order.
///
/// A feed that parses but has no entries is `Ok(vec![])`, not an error.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError>;
}

/// [`FeedFetcher`] over HTTP(S) using a shared `reqwest` client.
///
/// Makes exactly one attempt per call: 429 and 5xx responses fail
/// immediately rather than backing off inside an ingestion pass.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpFetcher {
    /// Default cap on a feed document (10MB)
    pub const DEFAULT_MAX_BYTES: usize = 10 * 1024 * 1024;

    pub fn new(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    /// Build a fetcher (and its client) from configuration
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.fetch_timeout())
            .build()?;
        Ok(Self::new(
            client,
            config.fetch_timeout(),
            config.max_feed_bytes,
        ))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.max_bytes).await
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>, FetchError> {
        // One deadline covers connect, headers and the streamed body
        let bytes = tokio::time::timeout(self.timeout, self.download(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let entries = parse_feed(&bytes, url).map_err(|e| FetchError::Parse(e.to_string()))?;
        tracing::debug!(feed = %url, bytes = bytes.len(), entries = entries.len(), "Feed parsed");
        Ok(entries)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <item><title>Test</title><link>https://example.com/1</link><description>Body</description></item>
</channel></rss>"#;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(
            reqwest::Client::new(),
            Duration::from_secs(5),
            HttpFetcher::DEFAULT_MAX_BYTES,
        )
    }

    async fn serve(template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_string(VALID_RSS)
                .insert_header("Content-Type", "application/rss+xml"),
        )
        .await;

        let entries = fetcher()
            .fetch(&format!("{}/feed", server.uri()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Test"));
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let server = serve(ResponseTemplate::new(404)).await;

        let result = fetcher().fetch(&format!("{}/feed", server.uri())).await;
        match result {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_fails_without_retry() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = fetcher().fetch(&format!("{}/feed", mock_server.uri())).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn test_fetch_malformed_is_parse_error() {
        let server = serve(ResponseTemplate::new(200).set_body_string("<not valid xml")).await;

        let err = fetcher()
            .fetch(&format!("{}/feed", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_parse(), "Expected Parse error, got {:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_empty_feed_is_empty_vec() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel></channel></rss>"#;
        let server = serve(ResponseTemplate::new(200).set_body_string(empty_rss)).await;

        let entries = fetcher()
            .fetch(&format!("{}/feed", server.uri()))
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = serve(
            ResponseTemplate::new(200)
                .set_body_string(VALID_RSS)
                .set_delay(Duration::from_millis(500)),
        )
        .await;

        let fetcher = HttpFetcher::new(
            reqwest::Client::new(),
            Duration::from_millis(50),
            HttpFetcher::DEFAULT_MAX_BYTES,
        );
        let result = fetcher.fetch(&format!("{}/feed", server.uri())).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = serve(ResponseTemplate::new(200).set_body_string(VALID_RSS)).await;

        let fetcher = HttpFetcher::new(reqwest::Client::new(), Duration::from_secs(5), 16);
        let result = fetcher.fetch(&format!("{}/feed", server.uri())).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge(16))));
    }
}

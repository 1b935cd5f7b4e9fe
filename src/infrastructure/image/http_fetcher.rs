//! HTTP adapter for downloading photo bytes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use tracing::{debug, trace, warn};

use crate::domain::entities::{FetchedResponse, RequestIdentity, ResponseMetadata};
use crate::domain::errors::PhotoError;
use crate::domain::ports::ImageFetchPort;

/// Default user agent for photo requests.
pub const DEFAULT_USER_AGENT: &str = concat!("photo-gallery/", env!("CARGO_PKG_VERSION"));

/// Configuration for [`HttpImageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Whole-request timeout. `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

/// Fetches photos over HTTP(S).
///
/// Every fetch opens its own client carrying the photo's headers as default
/// headers; the client is dropped when the fetch returns, success or not.
/// Any HTTP response counts as a completed fetch, whatever its status; only
/// transport failures are errors.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    config: HttpFetcherConfig,
}

impl HttpImageFetcher {
    /// Creates a fetcher with the given configuration.
    #[must_use]
    pub const fn new(config: HttpFetcherConfig) -> Self {
        Self { config }
    }

    fn open_session(&self, request: &RequestIdentity) -> Result<Client, PhotoError> {
        let mut builder = Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .default_headers(header_map(request));
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| PhotoError::network(format!("failed to create HTTP client: {e}")))
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch(&self, request: &RequestIdentity) -> Result<FetchedResponse, PhotoError> {
        let url = Url::parse(request.url()).map_err(|e| PhotoError::invalid_locator(request.url(), e))?;
        let session = self.open_session(request)?;

        debug!(request = %request, "Downloading photo");

        let response = session.get(url).send().await.map_err(|e| {
            warn!(request = %request, error = %e, "Photo request failed");
            PhotoError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(request = %request, status = status.as_u16(), "Photo request answered with non-success status");
        }

        let mut metadata = ResponseMetadata::new(status.as_u16(), response.url().as_str());
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                metadata = metadata.with_header(name.as_str(), value);
            }
        }

        let body = response.bytes().await?;
        trace!(request = %request, size = body.len(), "Photo session finished");

        Ok(FetchedResponse {
            request: request.clone(),
            metadata,
            body,
        })
    }
}

fn header_map(request: &RequestIdentity) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid photo request header"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PhotoHeaders;

    #[test]
    fn test_header_map_skips_invalid_entries() {
        let mut headers = PhotoHeaders::new();
        headers.insert("X-Ok".to_string(), "yes".to_string());
        headers.insert("Bad Name".to_string(), "v".to_string());
        headers.insert("X-Bad-Value".to_string(), "line\nbreak".to_string());
        let request = RequestIdentity::get("https://x/img.png")
            .unwrap()
            .with_headers(&headers);

        let map = header_map(&request);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-ok").and_then(|v| v.to_str().ok()), Some("yes"));
    }

    #[tokio::test]
    async fn test_non_success_status_still_returns_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0_u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = b"GIF89a";
            let head = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            let _ = socket.shutdown().await;
        });

        let request = RequestIdentity::get(&format!("http://{addr}/img.png")).unwrap();
        let response = HttpImageFetcher::default().fetch(&request).await.unwrap();

        assert_eq!(response.metadata.status, 404);
        assert!(!response.metadata.is_success());
        assert_eq!(&response.body[..], b"GIF89a");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let request = RequestIdentity::get(&format!("http://{addr}/img.png")).unwrap();
        let err = HttpImageFetcher::default().fetch(&request).await.unwrap_err();

        assert!(matches!(err, PhotoError::Network { .. }));
    }
}

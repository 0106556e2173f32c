use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Time allowed to establish the connection and receive response headers.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Time allowed to read the full response body.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching a feed page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request URL is empty, unparseable, or not http/https.
    /// No network I/O is attempted for such a URL.
    #[error("invalid request URL")]
    InvalidUrl,
    /// The connect or read deadline elapsed.
    #[error("request timed out")]
    Timeout,
    /// Transport-level failure: DNS, connection reset, TLS, etc.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The server answered with a non-200 status.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the size limit.
    #[error("response too large")]
    ResponseTooLarge,
}

/// Issues a single bounded GET and returns the raw body bytes.
///
/// One attempt, no retries. The connection is released on every exit path —
/// the response is either drained to completion or dropped with the error.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Fetcher {
    /// Fetcher with the standard 15s connect / 10s read deadlines.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Fetcher with custom deadlines. Tests use short deadlines against a
    /// mock server to exercise the timeout path without waiting it out.
    pub fn with_timeouts(connect: Duration, read: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().connect_timeout(connect).build()?;
        Ok(Self {
            client,
            connect_timeout: connect,
            read_timeout: read,
        })
    }

    /// GET `url` and return the full response body.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] — syntactically invalid URL, nothing sent
    /// - [`FetchError::Timeout`] — connect or read deadline elapsed
    /// - [`FetchError::HttpStatus`] — any status other than 200
    /// - [`FetchError::Network`] — transport failure
    /// - [`FetchError::ResponseTooLarge`] — body over the 10MB cap
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl);
        }

        let response = tokio::time::timeout(self.connect_timeout, self.client.get(parsed).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!(url = %url, status = status, "feed request rejected");
            return Err(FetchError::HttpStatus(status));
        }

        tokio::time::timeout(self.read_timeout, read_limited_bytes(response, MAX_BODY_SIZE))
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

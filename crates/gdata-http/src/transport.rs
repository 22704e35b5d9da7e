//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use gdata_core::error::TransportError;
use gdata_core::{Method, Request, Response, Transport};
use reqwest::header::{CONTENT_TYPE, ETAG, HeaderName};
use tracing::{debug, instrument, trace};

const DEFAULT_USER_AGENT: &str = concat!("gdata-rs/", env!("CARGO_PKG_VERSION"));

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransportBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Whole-request timeout; none by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let mut builder = reqwest::Client::builder().user_agent(
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        );
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;
        Ok(HttpTransport { client })
    }
}

/// Performs requests over HTTP(S).
///
/// Every status comes back as a [`Response`]; only failures to get one at
/// all are errors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// A transport with the default user agent and no timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Use an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, uri = %request.uri))]
    async fn perform(&self, request: Request) -> Result<Response, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.uri);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let header = |name: HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(CONTENT_TYPE);
        let etag = header(ETAG);
        trace!(status, ?content_type, ?etag, "response headers");

        let body = response.text().await.map_err(transport_error)?;
        debug!(status, body_len = body.len(), "response received");

        Ok(Response {
            status,
            content_type,
            etag,
            body,
        })
    }
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_options() {
        let transport = HttpTransport::builder()
            .user_agent("test-agent/1.0")
            .timeout(Duration::from_secs(5))
            .build();
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn connection_failure() {
        let transport = HttpTransport::new().unwrap();
        // Port 9 (discard) is closed on test machines.
        let err = transport
            .perform(Request::get("http://127.0.0.1:9/feed"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connection { .. }));
    }
}

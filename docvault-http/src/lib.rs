//! # `docvault-http`
//!
//! [`Transport`] implementation for docvault over HTTP, backed by `reqwest`.
//!
//! The transport does no retrying and no error translation of its own: every
//! HTTP answer, success or failure, becomes a [`ResponseEnvelope`] and only a
//! request that got no answer at all is reported as `Error::Connection`.

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use async_trait::async_trait;
use docvault::config::ClientConfig;
use docvault::error::{Error, Result};
use docvault::response::ResponseEnvelope;
use docvault::transport::{ApiRequest, Method, Transport};
use reqwest::Client;
use tracing::{debug, warn};

/// Sends vault requests over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Builds a transport for the node named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the config is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.base_url()))
    }

    /// Wraps an existing client, e.g. one with custom TLS roots.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &ApiRequest, token: Option<&str>) -> Result<ResponseEnvelope> {
        let url = self.url(request.path());
        debug!(method = %request.method(), %url, "sending request");

        let mut builder = match request.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed without a response");
            Error::Connection(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Connection(format!("failed to read response body: {e}")))?;
        debug!(status, bytes = body.len(), "received response");

        Ok(ResponseEnvelope::from_http(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::with_client(Client::new(), "https://node.example/");
        assert_eq!(transport.base_url(), "https://node.example");
        assert_eq!(
            transport.url("/api/v2/node/version"),
            "https://node.example/api/v2/node/version"
        );
        assert_eq!(transport.url("api/v2/vault/db"), "https://node.example/api/v2/vault/db");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::new("ftp://node.example");
        assert!(matches!(HttpTransport::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_new_from_config() {
        let config = ClientConfig::new("http://127.0.0.1:5000/").with_request_timeout_secs(5);
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:5000");
    }
}

//! HTTP transport backed by `reqwest`.

use crate::api::client::{ChatTransport, RawResponse, TransportError};
use crate::api::types::ChatRequest;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Path of the chat endpoint relative to the service base URL.
pub const CHAT_PATH: &str = "/api/chat";

/// Posts chat requests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Create a transport for the service at `base_url`.
    ///
    /// `timeout` of `None` lets requests run to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: format!("{}{CHAT_PATH}", base_url.trim_end_matches('/')),
        })
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(
        &self,
        request: &ChatRequest,
    ) -> std::result::Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;

        Ok(RawResponse { status, body })
    }
}

use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::backend::{profile, BackendKind};
use crate::error::{Result, TransportError};
use crate::request::build_request_body;
use crate::sse::decode_sse;
use crate::types::{ChatMessage, SamplingParams, TokenDelta};

/// How much of an error body survives into the error message
const ERROR_BODY_EXCERPT: usize = 512;

/// Opens completion requests against one backend's endpoint and decodes the
/// streamed reply. One instance per configured connection.
pub struct StreamTransport {
    http_client: reqwest::Client,
    endpoint: String,
    backend: BackendKind,
}

impl StreamTransport {
    pub fn new(
        endpoint: impl Into<String>,
        backend: BackendKind,
        api_key: Option<&str>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| TransportError::Http {
                    status: 0,
                    body: "invalid API key format".to_string(),
                })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            backend,
        })
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Issue the streaming completion request and return the decoded token
    /// stream. The caller holds the cancellation token; signalling it ends
    /// the stream with a distinct `Cancelled` outcome.
    pub async fn stream(
        &self,
        messages: &[ChatMessage],
        params: &SamplingParams,
        cancel: CancellationToken,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<TokenDelta>> + Send>>> {
        let body = build_request_body(self.backend, messages, params);

        tracing::debug!(
            backend = ?self.backend,
            model = %params.model,
            "opening completion stream"
        );

        let request = self.http_client.post(&self.endpoint).json(&body).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            response = request => response?,
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let body = body.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(TransportError::Http { status, body });
        }

        Ok(decode_sse(
            response.bytes_stream(),
            profile(self.backend),
            cancel,
        ))
    }
}

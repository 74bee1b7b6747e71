use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::api::ResponsesRequest;
use crate::core::error::ChatError;
use crate::utils::auth::add_bearer_auth;
use crate::utils::url::construct_api_url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const RESPONSES_ENDPOINT: &str = "v1/responses";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Upper bound on how much of an error body is kept for diagnosis.
pub const ERROR_BODY_LIMIT: usize = 8 * 1024;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub api_key: String,
    /// Explicit outbound proxy; when unset reqwest's environment-derived
    /// proxy settings apply.
    pub proxy_url: Option<String>,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            proxy_url: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url.filter(|url| !url.trim().is_empty());
        self
    }
}

/// Outcome of one POST: either a 2xx response whose body is still unread, or
/// the status and a bounded prefix of the error body.
#[derive(Debug)]
pub enum TransportResponse {
    Success(reqwest::Response),
    Failure { status: u16, body: String },
}

/// Issues single POSTs to the Responses endpoint. Holds no per-call state.
#[derive(Clone, Debug)]
pub struct Transport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self, ChatError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);

        if let Some(proxy_url) = &config.proxy_url {
            match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => warn!(%proxy_url, error = %err, "Ignoring invalid proxy URL"),
            }
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: construct_api_url(&config.base_url, RESPONSES_ENDPOINT),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, payload: &ResponsesRequest) -> Result<TransportResponse, ChatError> {
        debug!(
            endpoint = %self.endpoint,
            model = %payload.model,
            stream = payload.stream,
            "Sending responses request"
        );

        let request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        let response = add_bearer_auth(request, &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(TransportResponse::Success(response));
        }

        let body = read_bounded_body(response, ERROR_BODY_LIMIT).await;
        debug!(status = status.as_u16(), body_len = body.len(), "Responses request rejected");
        Ok(TransportResponse::Failure {
            status: status.as_u16(),
            body,
        })
    }
}

/// Reads at most `limit` bytes of the body, lossily decoded as UTF-8.
/// Read errors end the capture early rather than failing.
pub async fn read_bounded_body(response: reqwest::Response, limit: usize) -> String {
    let mut body: Vec<u8> = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else {
            break;
        };
        let remaining = limit.saturating_sub(body.len());
        body.extend_from_slice(&chunk[..chunk.len().min(remaining)]);
        if body.len() >= limit {
            break;
        }
    }

    String::from_utf8_lossy(&body).into_owned()
}

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl ClientError {
    fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            ClientError::Timeout(timeout)
        } else if error.is_connect() {
            ClientError::Connection(error.to_string())
        } else if error.is_decode() {
            ClientError::Parse(error.to_string())
        } else {
            ClientError::Other(error.to_string())
        }
    }
}

/// Request body for Ollama's `/api/generate`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Stored when a successful reply has no `response` field at all.
pub const NO_RESPONSE: &str = "Sin respuesta";

fn default_response() -> Option<String> {
    Some(NO_RESPONSE.to_string())
}

/// The subset of the `/api/generate` response used for throughput.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// Tokens generated
    #[serde(default)]
    pub eval_count: u64,
    /// Generation time in nanoseconds
    #[serde(default)]
    pub eval_duration: u64,
    /// `None` only for an explicit `"response": null`
    #[serde(default = "default_response")]
    pub response: Option<String>,
}

impl GenerateResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, ClientError> {
        serde_json::from_slice(body).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Configuration for creating an Ollama client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the inference server, without the `/api` suffix
    pub base_url: String,
    /// Timeout for each generation request
    pub timeout: Duration,
    /// Timeout for the availability check
    pub health_check_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    health_check_timeout: Duration,
}

impl OllamaClient {
    /// Creates a client for an Ollama-compatible server.
    ///
    /// No retries are configured: every call is a single attempt bounded by
    /// its own timeout.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use llm_eval::client::{ClientConfig, OllamaClient};
    /// use std::time::Duration;
    ///
    /// let client = OllamaClient::new(ClientConfig {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     timeout: Duration::from_secs(120),
    ///     health_check_timeout: Duration::from_secs(5),
    /// })
    /// .unwrap();
    /// ```
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            health_check_timeout: config.health_check_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query `/api/tags` once. Ready only on HTTP 200; any transport
    /// failure or other status counts as not ready.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        log::debug!("Availability check: GET {}", url);

        match self
            .client
            .get(&url)
            .timeout(self.health_check_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status != StatusCode::OK {
                    log::debug!("Availability check returned {}", status);
                }
                status == StatusCode::OK
            }
            Err(e) => {
                log::debug!("Availability check failed: {}", e);
                false
            }
        }
    }

    /// Send one non-streamed generation request and return the undecoded body
    /// of an HTTP 200 reply. Decode it with [`GenerateResponse::from_slice`].
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<Vec<u8>, ClientError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        // The body read is bounded by the same request timeout
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;

        Ok(body.to_vec())
    }
}

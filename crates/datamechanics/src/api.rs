//! REST client for the Data Mechanics job endpoints.
//!
//! Wraps the remote HTTP API (job creation, status fetch, log
//! streaming) using [`reqwest`], applying the bounded retry policy
//! from [`crate::retry`] and an optional transport-level request log.
//! Polling deliberately uses an instance with request logging switched
//! off so the log is not flooded by status fetches.

use async_trait::async_trait;
use reqwest::Method;
use sparkjob_core::error::RunError;

use crate::retry::RetryPolicy;
use crate::status::AppResponse;

/// User-Agent sent with every request.
const USER_AGENT: &str = "Internal DataMechanics API Rust Client";

/// Upper bound on a single log write, in bytes.
const LOG_CHUNK_SIZE: usize = 1024;

/// Errors from the job API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.) and
    /// the retry budget is exhausted.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-retriable status, or a retriable one
    /// past the retry budget.
    #[error("Data Mechanics API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for the user-facing message.
        body: String,
    },

    /// A payload could not be decoded as the expected JSON shape.
    #[error("Malformed JSON payload: {0}")]
    Json(#[source] serde_json::Error),
}

impl From<ApiError> for RunError {
    fn from(e: ApiError) -> Self {
        // Upstream 4xx, exhausted transient retries, and malformed
        // payloads all surface to the user with the upstream message.
        RunError::User(e.to_string())
    }
}

/// Body of a `POST /apps` job-creation request.
///
/// Never mutated after submission. `config_overrides` always
/// serializes as an object, even when empty.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub app_name: String,
    pub job_name: String,
    pub config_template_name: String,
    pub config_overrides: serde_json::Map<String, serde_json::Value>,
}

/// The job-service seam the orchestrator drives.
///
/// Implemented by [`DataMechanicsApi`]; tests swap in in-memory fakes.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a remote job. Returns the parsed response body.
    async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError>;

    /// Fetch a fresh status snapshot for `app_name`.
    async fn status(&self, app_name: &str) -> Result<AppResponse, ApiError>;

    /// Stream the job's logs to the run log, consuming the stream to
    /// exhaustion in bounded reads. Returns the byte count consumed.
    async fn stream_logs(&self, app_name: &str) -> Result<u64, ApiError>;
}

#[async_trait]
impl<T: JobService> JobService for std::sync::Arc<T> {
    async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        (**self).submit(request).await
    }

    async fn status(&self, app_name: &str) -> Result<AppResponse, ApiError> {
        (**self).status(app_name).await
    }

    async fn stream_logs(&self, app_name: &str) -> Result<u64, ApiError> {
        (**self).stream_logs(app_name).await
    }
}

/// HTTP client for one Data Mechanics deployment.
pub struct DataMechanicsApi {
    client: reqwest::Client,
    api_base: String,
    api_token: String,
    log_requests: bool,
    retry: RetryPolicy,
}

impl DataMechanicsApi {
    /// Create a client for the deployment at `api_url`.
    pub fn new(api_url: String, api_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, api_token)
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (connection pooling across the logging and non-logging
    /// instances of one run).
    pub fn with_client(client: reqwest::Client, api_url: String, api_token: String) -> Self {
        Self {
            client,
            api_base: format!("{}/api", api_url.trim_end_matches('/')),
            api_token,
            log_requests: true,
            retry: RetryPolicy::default(),
        }
    }

    /// Toggle transport-level request/response logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    /// Override the default retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Send one logical request, retrying transient failures within
    /// the policy budget. Returns the first successful response.
    async fn send_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/{}", self.api_base, path);
        let mut attempt: u32 = 1;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header("X-API-Key", &self.api_token)
                .header(reqwest::header::USER_AGENT, USER_AGENT);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if self.log_requests {
                        tracing::info!(
                            target: "datamechanics_api",
                            method = %method,
                            %url,
                            status = status.as_u16(),
                            "Request completed",
                        );
                    }
                    if status.is_success() {
                        return Ok(response);
                    }
                    if !self.retry.should_retry(attempt, Some(status.as_u16())) {
                        let body = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "<unreadable body>".to_string());
                        return Err(ApiError::Api {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    tracing::warn!(
                        method = %method,
                        %url,
                        status = status.as_u16(),
                        attempt,
                        "Server error, retrying",
                    );
                }
                Err(e) => {
                    if !self.retry.should_retry(attempt, None) {
                        return Err(ApiError::Request(e));
                    }
                    tracing::warn!(
                        method = %method,
                        %url,
                        error = %e,
                        attempt,
                        "Transport error, retrying",
                    );
                }
            }

            tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            attempt += 1;
        }
    }

    /// Submit a job via `POST /apps`.
    pub async fn create_app(
        &self,
        request: &JobRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        let body = serde_json::to_value(request).map_err(ApiError::Json)?;
        let response = self.send_with_retry(Method::POST, "apps", Some(&body)).await?;
        let text = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(ApiError::Json)?;
        Ok(value.as_object().cloned().unwrap_or_default())
    }

    /// Fetch the status snapshot via `GET /apps/{appName}`.
    pub async fn get_app(&self, app_name: &str) -> Result<AppResponse, ApiError> {
        let response = self
            .send_with_retry(Method::GET, &format!("apps/{app_name}"), None)
            .await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(ApiError::Json)
    }

    /// Stream job logs via `GET /apps/{appName}/logs`, forwarding them
    /// into the run log line by line until end-of-stream.
    ///
    /// Lines and multi-byte characters may straddle network chunks, so
    /// bytes are buffered until a newline arrives; a pathological line
    /// with no newline is flushed in bounded pieces, split only at
    /// character boundaries.
    pub async fn fetch_logs(&self, app_name: &str) -> Result<u64, ApiError> {
        let mut response = self
            .send_with_retry(Method::GET, &format!("apps/{app_name}/logs"), None)
            .await?;

        let mut total: u64 = 0;
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            total += chunk.len() as u64;
            buffer.extend_from_slice(&chunk);
            while let Some(line) = next_line(&mut buffer) {
                emit_log_line(app_name, &line);
            }
            while buffer.len() >= LOG_CHUNK_SIZE {
                let end = match floor_char_boundary(&buffer, LOG_CHUNK_SIZE) {
                    // Invalid leading continuation bytes: still make
                    // progress rather than looping.
                    0 => LOG_CHUNK_SIZE.min(buffer.len()),
                    end => end,
                };
                let piece: Vec<u8> = buffer.drain(..end).collect();
                emit_log_line(app_name, &String::from_utf8_lossy(&piece));
            }
        }
        if !buffer.is_empty() {
            emit_log_line(app_name, &String::from_utf8_lossy(&buffer));
        }
        Ok(total)
    }
}

/// Pop the next complete line (through `\n`) off the front of
/// `buffer`, decoding it lossily.
fn next_line(buffer: &mut Vec<u8>) -> Option<String> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=pos).collect();
    Some(String::from_utf8_lossy(&line).trim_end().to_string())
}

/// Largest index `<= max` that does not land inside a multi-byte
/// UTF-8 sequence in `buf`.
fn floor_char_boundary(buf: &[u8], max: usize) -> usize {
    if max >= buf.len() {
        return buf.len();
    }
    let mut end = max;
    while end > 0 && (buf[end] & 0b1100_0000) == 0b1000_0000 {
        end -= 1;
    }
    end
}

fn emit_log_line(app_name: &str, line: &str) {
    let line = line.trim_end();
    if !line.trim().is_empty() {
        tracing::info!(target: "job_logs", app_name, "{line}");
    }
}

#[async_trait]
impl JobService for DataMechanicsApi {
    async fn submit(
        &self,
        request: &JobRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, ApiError> {
        self.create_app(request).await
    }

    async fn status(&self, app_name: &str) -> Result<AppResponse, ApiError> {
        self.get_app(app_name).await
    }

    async fn stream_logs(&self, app_name: &str) -> Result<u64, ApiError> {
        self.fetch_logs(app_name).await
    }
}

//! Generative AI REST client.

use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use tracing::debug;

use viva_protocols::TaskError;

use crate::types::{ApiError, GenerateContentRequest, GenerateContentResponse};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Hold-off applied when a rate-limit response carries no Retry-After.
const DEFAULT_RATE_LIMIT_SECS: i64 = 60;

/// Client for one-shot generate-content calls.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at a different endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Generate content (non-streaming).
    ///
    /// A 429 maps to [`TaskError::RateLimited`] with the resume time
    /// taken from Retry-After when present; 5xx maps to
    /// [`TaskError::Transient`]; other client errors are terminal.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, TaskError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        debug!("generate_content: model={}", model);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| TaskError::Transient(format!("network: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let resume_at = Utc::now() + Duration::seconds(retry_after_secs(&response));
            return Err(TaskError::RateLimited { resume_at });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TaskError::Transient(format!("network: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return if status.is_server_error() {
                Err(TaskError::Transient(format!("{}: {}", status, message)))
            } else {
                Err(TaskError::Terminal(format!("{}: {}", status, message)))
            };
        }

        serde_json::from_str(&body)
            .map_err(|e| TaskError::Terminal(format!("unparseable response: {}", e)))
    }
}

fn retry_after_secs(response: &reqwest::Response) -> i64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT_SECS)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

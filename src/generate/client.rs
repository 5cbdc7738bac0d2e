//! Remote generation service client

use super::GenerationError;
use crate::config::GenerationConfig;
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Body posted to the generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: i64,
    pub num_steps: u32,
    pub cfg_strength: f32,
    pub duration: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, config: &GenerationConfig) -> Self {
        Self {
            prompt: prompt.into(),
            seed: config.seed,
            num_steps: config.num_steps,
            cfg_strength: config.cfg_strength,
            duration: config.duration,
        }
    }
}

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Build the error for a failed response
///
/// Prefers the service's own `error` message, then the status reason.
fn service_error(status: reqwest::StatusCode, body: &[u8]) -> GenerationError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("generation failed")
                .to_string()
        });

    GenerationError::Service {
        status: status.as_u16(),
        message,
    }
}

/// Client for a remote generation service
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Generate a sample for `prompt`
    ///
    /// Single attempt; the configured timeout bounds the whole request.
    pub async fn generate(&self, prompt: &str) -> Result<Sample, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let request = GenerationRequest::new(prompt, &self.config);
        debug!(endpoint = %self.config.endpoint, ?request, "requesting generation");

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(service_error(status, &body));
        }
        if body.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let sample = Sample::from_wav_bytes(&body)?;
        info!(
            bytes = body.len(),
            frames = sample.frame_count(),
            sample_rate = sample.sample_rate(),
            "generated sample"
        );
        Ok(sample)
    }
}

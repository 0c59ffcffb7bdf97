use std::time::Duration;

use reqwest::blocking::Client;

use crate::vision::{AnalysisError, ProviderReply, ProviderRequest, VisionProvider};

/// Blocking transport for xAI's OpenAI-compatible chat completion API.
///
/// Holds one pooled client for the process. Build it off the async runtime:
/// reqwest's blocking client starts its own runtime and panics if created
/// from inside a tokio worker.
#[derive(Debug, Clone)]
pub struct XaiVisionProvider {
    client: Client,
    timeout: Duration,
}

impl XaiVisionProvider {
    pub fn new(timeout: Duration) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Transport(format!("http client init failed: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl VisionProvider for XaiVisionProvider {
    fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, AnalysisError> {
        let resp = self
            .client
            .post(request.endpoint.as_str())
            .bearer_auth(request.api_key.as_str())
            .json(&request.body)
            .send()
            .map_err(|e| AnalysisError::Transport(format!("xAI request failed: {e}")))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| AnalysisError::Transport(format!("xAI body read failed: {e}")))?;
        Ok(ProviderReply { status, body })
    }
}

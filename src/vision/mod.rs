//! Photo analysis through a vision-capable chat completion API.
//!
//! [`VisionAnalyzer`] owns the provider contract: it builds the multimodal
//! request, hands it to a [`VisionProvider`] transport and turns the model's
//! free-form answer into an [`AnalysisResult`]. Answers that cannot be read as
//! the expected JSON object become a degraded result instead of an error.

pub mod answer;
pub mod xai;

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::{ServiceConfig, VISION_MODEL, VISION_TEMPERATURE};

pub use answer::{
    excerpt, extract_answer_text, parse_answer, strip_code_fence, AnalysisOutcome,
    AnalysisResult, AnswerParseError, DESCRIPTION_MAX_CHARS,
};
pub use xai::XaiVisionProvider;

const LOG_EXCERPT_CHARS: usize = 200;

pub const ANALYSIS_PROMPT: &str = concat!(
    "Analyze this photo and return a JSON object with:\n",
    "- \"event_type\": what kind of event or scene (birthday, wedding, vacation, family, ",
    "portrait, landscape, food, sport, celebration, everyday, etc.)\n",
    "- \"emotions\": array of detected emotions (happy, sad, surprised, calm, excited, etc.)\n",
    "- \"estimated_date\": approximate date/era if determinable from context (YYYY-MM-DD or decade)\n",
    "- \"location\": likely location or setting description\n",
    "- \"weather\": weather/lighting conditions if outdoor\n",
    "- \"people_count\": number of people visible\n",
    "- \"description\": 1-2 sentence description of the scene\n",
    "Return ONLY valid JSON, no markdown."
);

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("XAI_API_KEY not configured")]
    NotConfigured,
    #[error("vision provider returned HTTP {status}")]
    Upstream { status: u16, body: String },
    #[error("vision provider request failed: {0}")]
    Transport(String),
    #[error("vision provider returned an unreadable response: {0}")]
    InvalidEnvelope(String),
}

/// A fully prepared call to the provider's chat completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub endpoint: String,
    pub api_key: String,
    pub body: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: String,
}

impl ProviderReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Transport seam for the external vision API. Implementations perform one
/// blocking HTTP exchange and must not retry.
pub trait VisionProvider: Send + Sync + 'static {
    fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, AnalysisError>;
}

pub type SharedVisionProvider = Arc<dyn VisionProvider>;

#[derive(Clone)]
pub struct VisionAnalyzer {
    provider: SharedVisionProvider,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
}

impl VisionAnalyzer {
    pub fn new(config: &ServiceConfig, provider: SharedVisionProvider) -> Self {
        Self {
            provider,
            api_key: config.xai_api_key.clone(),
            base_url: config.xai_base_url.trim_end_matches('/').to_string(),
            model: String::from(VISION_MODEL),
            temperature: VISION_TEMPERATURE,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn analyze(&self, media_reference: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_outcome(media_reference)
            .map(AnalysisOutcome::into_result)
    }

    pub fn analyze_outcome(
        &self,
        media_reference: &str,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AnalysisError::NotConfigured);
        };

        let request = ProviderRequest {
            endpoint: self.endpoint(),
            api_key: api_key.to_string(),
            body: build_request_body(self.model.as_str(), media_reference, self.temperature),
        };
        debug!(model = %self.model, endpoint = %request.endpoint, "calling vision provider");

        let reply = self.provider.send(&request)?;
        if !reply.is_success() {
            error!(
                status = reply.status,
                body = %excerpt(reply.body.as_str(), LOG_EXCERPT_CHARS),
                "vision provider returned an error status"
            );
            return Err(AnalysisError::Upstream {
                status: reply.status,
                body: reply.body,
            });
        }

        let envelope: Value = serde_json::from_str(reply.body.as_str())
            .map_err(|e| AnalysisError::InvalidEnvelope(e.to_string()))?;
        let answer = extract_answer_text(&envelope);
        let outcome = parse_answer(answer.as_str());
        if let AnalysisOutcome::Degraded { raw_text, reason } = &outcome {
            warn!(
                reason = %reason,
                answer = %excerpt(strip_code_fence(raw_text), LOG_EXCERPT_CHARS),
                "failed to parse vision answer as JSON; returning degraded analysis"
            );
        }
        Ok(outcome)
    }
}

pub fn build_request_body(model: &str, media_reference: &str, temperature: f64) -> Value {
    json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": [
                    {"type": "image_url", "image_url": {"url": media_reference}},
                    {"type": "text", "text": ANALYSIS_PROMPT},
                ],
            }
        ],
        "temperature": temperature,
    })
}

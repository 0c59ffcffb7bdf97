use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DESCRIPTION_MAX_CHARS: usize = 500;

const CODE_FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub event_type: String,
    pub emotions: Vec<String>,
    pub estimated_date: Option<String>,
    pub location: Option<String>,
    pub weather: Option<String>,
    pub people_count: u32,
    pub description: String,
}

impl AnalysisResult {
    /// Fallback record for an answer that could not be read as JSON.
    pub fn degraded(raw_text: &str) -> Self {
        Self {
            event_type: String::from("unknown"),
            emotions: Vec::new(),
            estimated_date: None,
            location: None,
            weather: None,
            people_count: 0,
            description: excerpt(raw_text, DESCRIPTION_MAX_CHARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Parsed(AnalysisResult),
    Degraded { raw_text: String, reason: String },
}

impl AnalysisOutcome {
    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::Parsed(result) => result,
            Self::Degraded { raw_text, .. } => AnalysisResult::degraded(raw_text.as_str()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

#[derive(Debug, Error)]
pub enum AnswerParseError {
    #[error("answer is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("answer is not a JSON object")]
    NotAnObject,
    #[error("field '{0}' is missing")]
    MissingField(&'static str),
    #[error("field '{0}' has an unexpected type")]
    InvalidField(&'static str),
}

pub fn parse_answer(raw_text: &str) -> AnalysisOutcome {
    match parse_analysis_json(strip_code_fence(raw_text)) {
        Ok(result) => AnalysisOutcome::Parsed(result),
        Err(reason) => AnalysisOutcome::Degraded {
            raw_text: raw_text.to_string(),
            reason: reason.to_string(),
        },
    }
}

/// Removes a markdown code fence some models wrap around JSON despite being
/// told not to. The opening fence line (with any language tag) and the last
/// closing fence are dropped.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with(CODE_FENCE) {
        return trimmed;
    }
    let body = trimmed
        .split_once('\n')
        .map_or(trimmed, |(_, rest)| rest);
    body.rfind(CODE_FENCE).map_or(body, |idx| &body[..idx])
}

pub fn parse_analysis_json(text: &str) -> Result<AnalysisResult, AnswerParseError> {
    let value: Value = serde_json::from_str(text).map_err(AnswerParseError::Json)?;
    let Value::Object(mut fields) = value else {
        return Err(AnswerParseError::NotAnObject);
    };

    let event_type = required_text(fields.remove("event_type"), "event_type")?;
    let description = required_text(fields.remove("description"), "description")?;
    let emotions = emotion_list(fields.remove("emotions"))?;
    let estimated_date = optional_text(fields.remove("estimated_date"), "estimated_date")?;
    let location = optional_text(fields.remove("location"), "location")?;
    let weather = optional_text(fields.remove("weather"), "weather")?;
    let people_count = people_count(fields.remove("people_count"))?;

    Ok(AnalysisResult {
        event_type,
        emotions,
        estimated_date,
        location,
        weather,
        people_count,
        description: excerpt(description.as_str(), DESCRIPTION_MAX_CHARS),
    })
}

/// Text of the first choice of a chat completion envelope. Content may be a
/// plain string or a list of typed parts; anything else reads as empty.
pub fn extract_answer_text(envelope: &Value) -> String {
    let content = envelope
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));

    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn required_text(value: Option<Value>, field: &'static str) -> Result<String, AnswerParseError> {
    match value {
        Some(Value::String(text)) => Ok(text),
        None | Some(Value::Null) => Err(AnswerParseError::MissingField(field)),
        Some(_) => Err(AnswerParseError::InvalidField(field)),
    }
}

fn optional_text(
    value: Option<Value>,
    field: &'static str,
) -> Result<Option<String>, AnswerParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        // Years come back as bare numbers often enough to accept them.
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(_) => Err(AnswerParseError::InvalidField(field)),
    }
}

fn emotion_list(value: Option<Value>) -> Result<Vec<String>, AnswerParseError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                _ => Err(AnswerParseError::InvalidField("emotions")),
            })
            .collect(),
        Some(_) => Err(AnswerParseError::InvalidField("emotions")),
    }
}

fn people_count(value: Option<Value>) -> Result<u32, AnswerParseError> {
    let invalid = || AnswerParseError::InvalidField("people_count");
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(number)) => {
            if let Some(count) = number.as_u64() {
                return u32::try_from(count).map_err(|_| invalid());
            }
            match number.as_f64() {
                Some(float)
                    if float >= 0.0 && float.fract() == 0.0 && float <= f64::from(u32::MAX) =>
                {
                    Ok(float as u32)
                }
                _ => Err(invalid()),
            }
        }
        Some(Value::String(text)) => text.trim().parse::<u32>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

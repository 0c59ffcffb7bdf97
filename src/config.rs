use std::time::Duration;

pub const DEFAULT_XAI_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const VISION_MODEL: &str = "grok-2-vision-latest";
pub const VISION_TEMPERATURE: f64 = 0.3;
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub xai_api_key: Option<String>,
    pub xai_base_url: String,
    pub bind: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            xai_api_key: None,
            xai_base_url: String::from(DEFAULT_XAI_BASE_URL),
            bind: String::from(DEFAULT_BIND),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let xai_api_key = lookup("XAI_API_KEY")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let xai_base_url = lookup("XAI_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_XAI_BASE_URL));
        let bind = lookup("AI_SERVICE_BIND")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| String::from(DEFAULT_BIND));

        Self {
            xai_api_key,
            xai_base_url,
            bind,
        }
    }

    pub fn xai_configured(&self) -> bool {
        self.xai_api_key.is_some()
    }

    pub fn with_xai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.xai_api_key = Some(api_key.into());
        self
    }
}

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EDIT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Configuration from environment
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    /// Image-to-image model used for mockups and edits.
    pub edit_model: String,
    /// Text-to-image model.
    pub image_model: String,
    /// `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GeminiConfig::default();
        Self {
            port: get("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            gemini: GeminiConfig {
                api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")).unwrap_or_default(),
                api_base: get("GEMINI_API_BASE")
                    .map(|b| b.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.api_base),
                edit_model: get("GEMINI_EDIT_MODEL").unwrap_or(defaults.edit_model),
                image_model: get("IMAGEN_MODEL").unwrap_or(defaults.image_model),
                timeout: get("GEMINI_TIMEOUT_SECS")
                    .and_then(|s| s.parse::<u64>().ok())
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs),
            },
        }
    }
}

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::Config;
use crate::state::AppState;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    pub open_ai_available: bool,
    pub perplexity_available: bool,
    pub error: Option<String>,
}

impl ApiStatus {
    pub fn from_config(config: &Config) -> Self {
        let open_ai_available = config.openai_available();
        let perplexity_available = config.perplexity_available();

        let error = match (open_ai_available, perplexity_available) {
            (true, true) => None,
            (false, false) => Some("Both OpenAI and Perplexity API keys are missing or invalid"),
            (false, true) => Some("OpenAI API key is missing or invalid"),
            (true, false) => Some("Perplexity API key is missing or invalid"),
        };

        Self {
            open_ai_available,
            perplexity_available,
            error: error.map(str::to_string),
        }
    }
}

/// GET /api/v1/status
/// Reports which provider credentials are configured. Never calls the providers.
pub async fn status_handler(State(state): State<AppState>) -> Json<ApiStatus> {
    Json(ApiStatus::from_config(&state.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_all_keys_present() {
        let status = ApiStatus::from_config(&test_config());
        assert_eq!(
            status,
            ApiStatus {
                open_ai_available: true,
                perplexity_available: true,
                error: None,
            }
        );
    }

    #[test]
    fn test_missing_perplexity_key_is_named() {
        let mut config = test_config();
        config.perplexity_api_key = None;
        let status = ApiStatus::from_config(&config);
        assert!(status.open_ai_available);
        assert_eq!(
            status.error.as_deref(),
            Some("Perplexity API key is missing or invalid")
        );
    }

    #[test]
    fn test_both_keys_missing() {
        let mut config = test_config();
        config.openai_api_key = Some("wrong-prefix".to_string());
        config.perplexity_api_key = None;
        let status = ApiStatus::from_config(&config);
        assert_eq!(
            status.error.as_deref(),
            Some("Both OpenAI and Perplexity API keys are missing or invalid")
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["openAiAvailable"], false);
    }
}

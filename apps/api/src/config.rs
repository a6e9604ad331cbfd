use anyhow::{Context, Result};

/// Service-account material for the Google Sheets email log.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub client_email: String,
    /// Raw value as found in the environment. Normalized by `sheets::normalize_private_key`.
    pub private_key: String,
    pub spreadsheet_id: String,
}

/// Application configuration loaded from environment variables.
///
/// Provider keys are optional at startup: `/api/v1/status` reports which ones
/// are present, and the orchestrator refuses to run without an OpenAI key.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub openai_model: String,
    pub llm_call_timeout_secs: u64,
    pub sheets_client_email: Option<String>,
    pub sheets_private_key: Option<String>,
    pub sheets_spreadsheet_id: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            perplexity_api_key: optional_env("PERPLEXITY_API_KEY"),
            openai_model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            llm_call_timeout_secs: std::env::var("LLM_CALL_TIMEOUT_SECS")
                .unwrap_or_else(|_| "90".to_string())
                .parse::<u64>()
                .context("LLM_CALL_TIMEOUT_SECS must be a whole number of seconds")?,
            sheets_client_email: optional_env("GOOGLE_SHEETS_CLIENT_EMAIL"),
            sheets_private_key: optional_env("GOOGLE_SHEETS_PRIVATE_KEY"),
            sheets_spreadsheet_id: optional_env("GOOGLE_SHEETS_SPREADSHEET_ID"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the sheets configuration only when all three variables are set.
    pub fn sheets(&self) -> Option<SheetsConfig> {
        Some(SheetsConfig {
            client_email: self.sheets_client_email.clone()?,
            private_key: self.sheets_private_key.clone()?,
            spreadsheet_id: self.sheets_spreadsheet_id.clone()?,
        })
    }

    /// OpenAI keys are only considered usable when they carry the `sk-` prefix.
    pub fn openai_available(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| key.starts_with("sk-"))
    }

    pub fn perplexity_available(&self) -> bool {
        self.perplexity_api_key
            .as_deref()
            .is_some_and(|key| key.len() > 10)
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        openai_api_key: Some("sk-test-key".to_string()),
        perplexity_api_key: Some("pplx-0123456789".to_string()),
        openai_model: "gpt-4o".to_string(),
        llm_call_timeout_secs: 90,
        sheets_client_email: None,
        sheets_private_key: None,
        sheets_spreadsheet_id: None,
        port: 8080,
        rust_log: "info".to_string(),
    }
}

//! Company research through a web-search backend, with a model fallback chain.
//!
//! Order of attempts:
//! 1. primary backend, each model in `PRIMARY_MODELS` (two parallel queries per model)
//! 2. secondary backend, one simplified combined query
//!
//! If both fail, the PRIMARY error is returned. The secondary's error is only
//! logged, so callers see the root cause rather than the last thing that broke.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::llm_client::{complete_within, ChatBackend, ChatRequest, LlmError};
use crate::prep::prompts::{
    COMBINED_RESEARCH_SYSTEM, COMBINED_RESEARCH_TEMPLATE, COMPANY_RESEARCH_SYSTEM,
    COMPANY_RESEARCH_TEMPLATE, WEBSITE_RESEARCH_SYSTEM, WEBSITE_RESEARCH_TEMPLATE,
};
use crate::prep::validation::company_domain;

/// Perplexity models tried in order by the primary research pass.
pub const PRIMARY_MODELS: [&str; 2] = ["sonar-reasoning-pro", "sonar-pro"];
/// Model used by the single simplified fallback query.
pub const SECONDARY_MODEL: &str = "sonar-pro";

#[derive(Clone)]
pub struct CompanyResearcher {
    primary: Arc<dyn ChatBackend>,
    primary_models: Vec<String>,
    secondary: Arc<dyn ChatBackend>,
    secondary_model: String,
    call_timeout: Duration,
}

impl CompanyResearcher {
    /// Uses the same backend for the primary chain and the simplified fallback.
    pub fn new(backend: Arc<dyn ChatBackend>, call_timeout: Duration) -> Self {
        Self {
            primary: backend.clone(),
            primary_models: PRIMARY_MODELS.iter().map(|m| m.to_string()).collect(),
            secondary: backend,
            secondary_model: SECONDARY_MODEL.to_string(),
            call_timeout,
        }
    }

    #[cfg(test)]
    pub fn with_secondary(mut self, secondary: Arc<dyn ChatBackend>) -> Self {
        self.secondary = secondary;
        self
    }

    /// Researches the company behind `company_url` and returns free-text notes.
    pub async fn search(&self, company_url: &str) -> Result<String, LlmError> {
        let primary_error = match self.search_primary(company_url).await {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        warn!("Primary research failed ({primary_error}), trying simplified query");

        match self.search_secondary(company_url).await {
            Ok(text) => Ok(text),
            Err(fallback_error) => {
                error!("Simplified research query also failed: {fallback_error}");
                Err(primary_error)
            }
        }
    }

    async fn search_primary(&self, company_url: &str) -> Result<String, LlmError> {
        let domain = company_domain(company_url);
        let website_prompt = WEBSITE_RESEARCH_TEMPLATE.replace("{company_url}", company_url);
        let company_prompt = COMPANY_RESEARCH_TEMPLATE.replace("{domain}", &domain);

        let mut last_error: Option<LlmError> = None;

        for model in &self.primary_models {
            info!("Researching {domain} with {} model {model}", self.primary.provider());

            let website = ChatRequest::new(model.as_str(), website_prompt.as_str())
                .system(WEBSITE_RESEARCH_SYSTEM);
            let company = ChatRequest::new(model.as_str(), company_prompt.as_str())
                .system(COMPANY_RESEARCH_SYSTEM);

            let (website_info, company_info) = tokio::join!(
                self.ask(self.primary.as_ref(), &website),
                self.ask(self.primary.as_ref(), &company),
            );

            match (website_info, company_info) {
                (Ok(website_info), Ok(company_info)) => {
                    info!("Research succeeded with model {model}");
                    return Ok(combine_research(&website_info, &company_info));
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Model {model} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(LlmError::ModelsExhausted {
            tried: self.primary_models.join(", "),
            last: Box::new(last_error.unwrap_or(LlmError::EmptyContent(self.primary.provider()))),
        })
    }

    async fn search_secondary(&self, company_url: &str) -> Result<String, LlmError> {
        let domain = company_domain(company_url);
        let prompt = COMBINED_RESEARCH_TEMPLATE
            .replace("{domain}", &domain)
            .replace("{company_url}", company_url);
        let request = ChatRequest::new(self.secondary_model.as_str(), prompt)
            .system(COMBINED_RESEARCH_SYSTEM);

        self.ask(self.secondary.as_ref(), &request).await
    }

    async fn ask(
        &self,
        backend: &dyn ChatBackend,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        let text = complete_within(backend, request, self.call_timeout).await?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent(backend.provider()));
        }
        Ok(text)
    }
}

fn combine_research(website_info: &str, company_info: &str) -> String {
    format!(
        "# Website-specific information:\n{}\n\n# General company information:\n{}",
        website_info.trim(),
        company_info.trim()
    )
}

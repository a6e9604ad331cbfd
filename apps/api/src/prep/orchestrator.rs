//! Prep orchestration: turns one `PrepRequest` into one `PrepResult`.
//!
//! Flow: classify role → research company → overview →
//!       (strategy ∥ questions) → clean + parse → result.
//!
//! Parse failures never reach the caller: each field parser returns a
//! `Result`, and `substitute` decides the default in one place.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::llm_client::clean::clean_text;
use crate::llm_client::extract::ParseError;
use crate::llm_client::{
    complete_within, ChatBackend, ChatRequest, LlmError, Provider, DEFAULT_MAX_TOKENS,
};
use crate::prep::models::{CompanyResearch, InterviewQA, PrepRequest, PrepResult, RoleAnalysis};
use crate::prep::prompts::{
    GENERAL_QUESTION_FOCUS, OPENAI_RESEARCH_TEMPLATE, OVERVIEW_TEMPLATE, QUESTIONS_TEMPLATE,
    ROLE_CLASSIFY_TEMPLATE, STRATEGY_TEMPLATE, TECHNICAL_QUESTION_FOCUS,
};
use crate::prep::research::CompanyResearcher;
use crate::prep::retry::Transient;

const CLASSIFY_TEMPERATURE: f32 = 0.3;
const GENERATION_TEMPERATURE: f32 = 0.7;

/// Error-text fragments that mark a failure as worth retrying even when the
/// typed error does not say so. Only consulted for errors without an HTTP status.
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timeout",
    "timed out",
    "502",
    "bad gateway",
    "invalid response",
    "unexpected token",
    "unexpected end of json",
];

/// Where an orchestration is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Classifying,
    Researching,
    Generating,
    Parsing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Classifying => "classifying",
            Stage::Researching => "researching",
            Stage::Generating => "generating",
            Stage::Parsing => "parsing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("{0} API key is not configured. Please check your environment variables.")]
    NotConfigured(Provider),

    #[error("{stage} failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("Incomplete results received: {0} was empty")]
    Incomplete(&'static str),
}

impl Transient for PrepError {
    fn is_transient(&self) -> bool {
        match self {
            PrepError::NotConfigured(_) => false,
            PrepError::Upstream { source, .. } => is_transient_llm_error(source),
            PrepError::Incomplete(_) => true,
        }
    }
}

/// A provider status code is authoritative; the text scan only applies when
/// there is none to go on.
fn is_transient_llm_error(error: &LlmError) -> bool {
    match error {
        LlmError::Api { .. } => error.is_transient(),
        LlmError::ModelsExhausted { last, .. } => is_transient_llm_error(last),
        other => other.is_transient() || has_transient_signature(&other.to_string()),
    }
}

fn has_transient_signature(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    /// Ceiling for every individual completion call.
    pub call_timeout: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            call_timeout: Duration::from_secs(90),
        }
    }
}

/// Sequences completion calls for one submission. Holds no per-request state,
/// so one instance is shared across all requests.
pub struct Orchestrator {
    openai: Option<Arc<dyn ChatBackend>>,
    researcher: Option<CompanyResearcher>,
    settings: GenerationSettings,
}

impl Orchestrator {
    pub fn new(
        openai: Option<Arc<dyn ChatBackend>>,
        researcher: Option<CompanyResearcher>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            openai,
            researcher,
            settings,
        }
    }

    /// Runs the full pipeline for one validated request.
    pub async fn prepare(&self, request: &PrepRequest) -> Result<PrepResult, PrepError> {
        let result = self.run(request).await;
        match &result {
            Ok(_) => info!(stage = %Stage::Done, "Interview prep generated"),
            Err(e) => error!(stage = %Stage::Failed, "Interview prep failed: {e}"),
        }
        result
    }

    async fn run(&self, request: &PrepRequest) -> Result<PrepResult, PrepError> {
        info!(stage = %Stage::Idle, "Starting interview prep for {}", request.company_url);

        // Configuration errors surface before any outbound call.
        let openai = self
            .openai
            .as_deref()
            .ok_or(PrepError::NotConfigured(Provider::OpenAi))?;

        info!(stage = %Stage::Classifying, "Classifying role");
        let role = self.classify_role(openai, &request.job_description).await;
        info!(
            "Role analysis: category={}, technical={}",
            role.role_category, role.is_technical
        );

        info!(stage = %Stage::Researching, "Researching company");
        let research = self.research_company(openai, &request.company_url).await?;

        info!(stage = %Stage::Generating, "Generating overview, strategy, and questions");
        let overview_raw = self
            .build_overview(openai, &research, &request.job_description)
            .await
            .map_err(generating)?;

        let (strategy_raw, questions_raw) = tokio::join!(
            self.build_strategy(openai, &request.job_description, &role),
            self.build_questions(openai, &request.job_description, &request.company_url, &role),
        );
        let strategy_raw = strategy_raw.map_err(generating)?;
        let questions_raw = questions_raw.map_err(generating)?;

        info!(stage = %Stage::Parsing, "Normalizing generated content");
        let company_overview = non_empty_html("companyOverview", &overview_raw)?;
        let role_requirements = non_empty_html("roleRequirements", &strategy_raw)?;
        let potential_questions = substitute(
            "potentialQuestions",
            InterviewQA::parse_list(&questions_raw),
            InterviewQA::fallback_list,
        );

        Ok(PrepResult {
            company_overview,
            role_requirements,
            potential_questions,
            role_category: role.role_category,
            using_perplexity: research.using_perplexity,
        })
    }

    /// Classifies the role. Never fails: any call or parse failure yields
    /// `RoleAnalysis::default()`.
    pub async fn classify_role(
        &self,
        openai: &dyn ChatBackend,
        job_description: &str,
    ) -> RoleAnalysis {
        let request = ChatRequest::new(
            self.settings.model.as_str(),
            ROLE_CLASSIFY_TEMPLATE.replace("{job_description}", job_description),
        )
        .temperature(CLASSIFY_TEMPERATURE);

        match self.call(openai, &request).await {
            Ok(raw) => substitute("roleAnalysis", RoleAnalysis::parse(&raw), RoleAnalysis::default),
            Err(e) => {
                warn!("Role classification call failed, using default analysis: {e}");
                RoleAnalysis::default()
            }
        }
    }

    /// Web-search research first, then OpenAI research without web access.
    /// `using_perplexity` records which one produced the text.
    pub async fn research_company(
        &self,
        openai: &dyn ChatBackend,
        company_url: &str,
    ) -> Result<CompanyResearch, PrepError> {
        match &self.researcher {
            Some(researcher) => match researcher.search(company_url).await {
                Ok(text) => {
                    return Ok(CompanyResearch {
                        text,
                        using_perplexity: true,
                    })
                }
                Err(e) => warn!("Perplexity research failed, falling back to OpenAI: {e}"),
            },
            None => info!("Perplexity not configured, researching with OpenAI"),
        }

        let request = ChatRequest::new(
            self.settings.model.as_str(),
            OPENAI_RESEARCH_TEMPLATE.replace("{company_url}", company_url),
        )
        .temperature(GENERATION_TEMPERATURE)
        .max_tokens(DEFAULT_MAX_TOKENS);

        let text = self
            .call(openai, &request)
            .await
            .map_err(|source| PrepError::Upstream {
                stage: Stage::Researching,
                source,
            })?;

        Ok(CompanyResearch {
            text,
            using_perplexity: false,
        })
    }

    pub async fn build_overview(
        &self,
        openai: &dyn ChatBackend,
        research: &CompanyResearch,
        job_description: &str,
    ) -> Result<String, LlmError> {
        // Model-produced text goes in last so its braces are never expanded.
        let prompt = OVERVIEW_TEMPLATE
            .replace("{job_description}", job_description)
            .replace("{research}", &research.text);
        self.generate(openai, prompt).await
    }

    pub async fn build_strategy(
        &self,
        openai: &dyn ChatBackend,
        job_description: &str,
        role: &RoleAnalysis,
    ) -> Result<String, LlmError> {
        let prompt = STRATEGY_TEMPLATE
            .replace("{role_kind}", role.kind())
            .replace("{role_category}", &role.role_category)
            .replace("{job_description}", job_description);
        self.generate(openai, prompt).await
    }

    pub async fn build_questions(
        &self,
        openai: &dyn ChatBackend,
        job_description: &str,
        company_url: &str,
        role: &RoleAnalysis,
    ) -> Result<String, LlmError> {
        let focus = if role.is_technical {
            TECHNICAL_QUESTION_FOCUS
        } else {
            GENERAL_QUESTION_FOCUS
        };
        let prompt = QUESTIONS_TEMPLATE
            .replace("{role_kind}", role.kind())
            .replace("{role_category}", &role.role_category)
            .replace("{question_focus}", focus)
            .replace("{company_url}", company_url)
            .replace("{job_description}", job_description);
        self.generate(openai, prompt).await
    }

    async fn generate(&self, openai: &dyn ChatBackend, prompt: String) -> Result<String, LlmError> {
        let request = ChatRequest::new(self.settings.model.as_str(), prompt)
            .temperature(GENERATION_TEMPERATURE)
            .max_tokens(DEFAULT_MAX_TOKENS);
        self.call(openai, &request).await
    }

    async fn call(
        &self,
        backend: &dyn ChatBackend,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        complete_within(backend, request, self.settings.call_timeout).await
    }
}

fn generating(source: LlmError) -> PrepError {
    PrepError::Upstream {
        stage: Stage::Generating,
        source,
    }
}

/// Cleans an HTML field; an empty result counts as a malformed response.
fn non_empty_html(field: &'static str, raw: &str) -> Result<String, PrepError> {
    let html = clean_text(raw);
    if html.is_empty() {
        return Err(PrepError::Incomplete(field));
    }
    Ok(html)
}

/// Central default-substitution policy for parsed fields.
fn substitute<T>(field: &str, parsed: Result<T, ParseError>, fallback: impl FnOnce() -> T) -> T {
    parsed.unwrap_or_else(|e| {
        warn!("Could not parse {field}, substituting default: {e}");
        fallback()
    })
}

/// LLM Client: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// All LLM interactions MUST go through a `ChatBackend`.
///
/// OpenAI and Perplexity share the `/chat/completions` wire shape, so one
/// client type serves both; `Provider` selects the endpoint and extras.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod clean;
pub mod extract;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Default completion budget for generation prompts.
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Perplexity,
}

impl Provider {
    fn endpoint(self) -> &'static str {
        match self {
            Provider::OpenAi => OPENAI_API_URL,
            Provider::Perplexity => PERPLEXITY_API_URL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "OpenAI"),
            Provider::Perplexity => write!(f, "Perplexity"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error (status {status}): {message}")]
    Api {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Invalid response format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0} returned empty content")]
    EmptyContent(Provider),

    #[error("LLM call timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("All models failed ({tried}); last error: {last}")]
    ModelsExhausted { tried: String, last: Box<LlmError> },
}

impl LlmError {
    /// Whether reissuing the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Parse(_) | LlmError::EmptyContent(_) | LlmError::Timeout(_) => true,
            LlmError::ModelsExhausted { last, .. } => last.is_transient(),
        }
    }
}

/// A provider-agnostic chat completion request: one system and one user message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: Option<String>,
    pub user: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            user: user.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Anything that can turn a `ChatRequest` into completion text.
///
/// Carried as `Arc<dyn ChatBackend>` so the orchestrator can be driven by
/// scripted backends in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Races a completion against a timer. The timer winning yields
/// `LlmError::Timeout`; the dropped call future aborts its HTTP request.
pub async fn complete_within(
    backend: &dyn ChatBackend,
    request: &ChatRequest,
    limit: Duration,
) -> Result<String, LlmError> {
    match tokio::time::timeout(limit, backend.complete(request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "{} call with model {} exceeded {}s",
                backend.provider(),
                request.model,
                limit.as_secs()
            );
            Err(LlmError::Timeout(limit))
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SearchOptions>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchOptions {
    web_search: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl CompletionResponse {
    /// Extracts the text of the first choice, if it is non-blank.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// HTTP client for one chat-completion provider.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: Provider,
    api_key: String,
}

impl LlmClient {
    pub fn new(client: Client, provider: Provider, api_key: String) -> Self {
        Self {
            client,
            provider,
            api_key,
        }
    }

    fn build_body<'a>(&self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.user,
        });

        CompletionRequest {
            model: &request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            options: match self.provider {
                Provider::Perplexity => Some(SearchOptions { web_search: true }),
                Provider::OpenAi => None,
            },
        }
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    /// Makes a single call to the provider and returns the first choice's text.
    /// Retrying is the caller's decision; see `prep::retry`.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = self.build_body(request);

        let response = self
            .client
            .post(self.provider.endpoint())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} API returned {}: {}", self.provider, status, body);
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                provider: self.provider,
                status: status.as_u16(),
                message,
            });
        }

        let raw = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&raw)?;

        if let Some(usage) = &completion.usage {
            debug!(
                "{} call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                self.provider, request.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        completion
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent(self.provider))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted backends for orchestration tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// A reply the scripted backend produces for a matching request.
    pub enum Reply {
        Text(String),
        Fail(LlmError),
        Hang,
    }

    type Matcher = Box<dyn Fn(&ChatRequest) -> bool + Send + Sync>;

    /// Backend that answers from a list of (matcher, queue of replies).
    /// Unmatched requests fail with a 500 so a missing script is loud.
    pub struct ScriptedBackend {
        provider: Provider,
        rules: Mutex<Vec<(Matcher, VecDeque<Reply>)>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(provider: Provider) -> Self {
            Self {
                provider,
                rules: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Every request whose user prompt contains `needle` gets `replies` in order;
        /// the last reply repeats once the queue would run dry.
        pub fn on(self, needle: &'static str, replies: Vec<Reply>) -> Self {
            self.on_request(move |r| r.user.contains(needle), replies)
        }

        pub fn on_request(
            self,
            matcher: impl Fn(&ChatRequest) -> bool + Send + Sync + 'static,
            replies: Vec<Reply>,
        ) -> Self {
            self.rules
                .lock()
                .unwrap()
                .push((Box::new(matcher), replies.into_iter().collect()));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn prompts_seen(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.user.clone())
                .collect()
        }

        pub fn models_seen(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.model.clone())
                .collect()
        }
    }

    pub fn text(s: &str) -> Reply {
        Reply::Text(s.to_string())
    }

    pub fn server_error(provider: Provider) -> Reply {
        Reply::Fail(LlmError::Api {
            provider,
            status: 500,
            message: "upstream failure".to_string(),
        })
    }

    fn clone_reply(reply: &Reply) -> Reply {
        match reply {
            Reply::Text(s) => Reply::Text(s.clone()),
            Reply::Hang => Reply::Hang,
            Reply::Fail(LlmError::Api {
                provider,
                status,
                message,
            }) => Reply::Fail(LlmError::Api {
                provider: *provider,
                status: *status,
                message: message.clone(),
            }),
            Reply::Fail(LlmError::Timeout(d)) => Reply::Fail(LlmError::Timeout(*d)),
            Reply::Fail(LlmError::EmptyContent(p)) => Reply::Fail(LlmError::EmptyContent(*p)),
            Reply::Fail(other) => Reply::Fail(LlmError::Api {
                provider: Provider::OpenAi,
                status: 500,
                message: other.to_string(),
            }),
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());

            let reply = {
                let mut rules = self.rules.lock().unwrap();
                rules
                    .iter_mut()
                    .find(|(matcher, _)| matcher(request))
                    .and_then(|(_, queue)| {
                        if queue.len() > 1 {
                            queue.pop_front()
                        } else {
                            queue.front().map(clone_reply)
                        }
                    })
            };

            match reply {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Fail(err)) => Err(err),
                Some(Reply::Hang) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                None => Err(LlmError::Api {
                    provider: self.provider,
                    status: 500,
                    message: format!("no scripted reply for prompt: {}", request.user),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn sample_request() -> ChatRequest {
        ChatRequest::new("gpt-4o", "Describe Acme")
            .system("You are a researcher.")
            .temperature(0.7)
            .max_tokens(DEFAULT_MAX_TOKENS)
    }

    #[test]
    fn test_openai_body_has_no_search_options() {
        let client = LlmClient::new(Client::new(), Provider::OpenAi, "sk-test".to_string());
        let request = sample_request();
        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Describe Acme");
        assert_eq!(body["max_tokens"], 1500);
        assert!(body.get("options").is_none());
    }

    #[test]
    fn test_perplexity_body_enables_web_search() {
        let client = LlmClient::new(Client::new(), Provider::Perplexity, "pplx".to_string());
        let request = ChatRequest::new("sonar-pro", "Research acme.com");
        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(body["options"]["web_search"], true);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_completion_response_text_reads_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Acme builds rockets."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
        }"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Acme builds rockets."));
    }

    #[test]
    fn test_completion_response_blank_content_is_none() {
        let json = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());

        let json = r#"{"choices": []}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_transient_classification() {
        let gateway = LlmError::Api {
            provider: Provider::OpenAi,
            status: 502,
            message: "Bad gateway".to_string(),
        };
        let bad_request = LlmError::Api {
            provider: Provider::OpenAi,
            status: 400,
            message: "invalid model".to_string(),
        };
        assert!(gateway.is_transient());
        assert!(!bad_request.is_transient());
        assert!(LlmError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(LlmError::EmptyContent(Provider::Perplexity).is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_within_times_out_hung_call() {
        let backend = ScriptedBackend::new(Provider::OpenAi).on("Describe", vec![Reply::Hang]);
        let result = complete_within(&backend, &sample_request(), Duration::from_secs(30)).await;
        assert!(matches!(result, Err(LlmError::Timeout(d)) if d == Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_complete_within_passes_through_reply() {
        let backend = ScriptedBackend::new(Provider::OpenAi).on("Describe", vec![text("Acme")]);
        let result = complete_within(&backend, &sample_request(), Duration::from_secs(30)).await;
        assert_eq!(result.unwrap(), "Acme");
        assert_eq!(backend.calls(), 1);
    }
}

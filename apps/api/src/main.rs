mod config;
mod errors;
mod llm_client;
mod prep;
mod routes;
mod sheets;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{ChatBackend, LlmClient, Provider};
use crate::prep::orchestrator::{GenerationSettings, Orchestrator};
use crate::prep::research::CompanyResearcher;
use crate::prep::retry::RetryPolicy;
use crate::routes::build_router;
use crate::sheets::SheetsClient;
use crate::state::AppState;

/// Headroom on top of the per-call ceiling so the race in `complete_within`
/// fires before the HTTP client gives up.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PrepCoach API v{}", env!("CARGO_PKG_VERSION"));

    let call_timeout = Duration::from_secs(config.llm_call_timeout_secs);
    let http = reqwest::Client::builder()
        .timeout(call_timeout + HTTP_TIMEOUT_MARGIN)
        .build()?;

    // Provider clients
    let openai = match &config.openai_api_key {
        Some(key) if config.openai_available() => {
            info!("OpenAI client initialized (model: {})", config.openai_model);
            Some(Arc::new(LlmClient::new(http.clone(), Provider::OpenAi, key.clone()))
                as Arc<dyn ChatBackend>)
        }
        _ => {
            warn!("OPENAI_API_KEY missing or invalid; prep requests will be refused");
            None
        }
    };

    let researcher = match &config.perplexity_api_key {
        Some(key) if config.perplexity_available() => {
            info!("Perplexity client initialized");
            let backend: Arc<dyn ChatBackend> =
                Arc::new(LlmClient::new(http.clone(), Provider::Perplexity, key.clone()));
            Some(CompanyResearcher::new(backend, call_timeout))
        }
        _ => {
            warn!("PERPLEXITY_API_KEY missing or invalid; company research will use OpenAI");
            None
        }
    };

    let settings = GenerationSettings {
        model: config.openai_model.clone(),
        call_timeout,
    };
    let orchestrator = Orchestrator::new(openai, researcher, settings);

    let sheets = config.sheets().map(|sheets| {
        info!("Google Sheets email log enabled");
        SheetsClient::new(http.clone(), sheets)
    });
    if sheets.is_none() {
        warn!("Google Sheets variables incomplete; email capture disabled");
    }

    // Build app state
    let state = AppState {
        config: config.clone(),
        http,
        orchestrator: Arc::new(orchestrator),
        retry: RetryPolicy::default(),
        sheets,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

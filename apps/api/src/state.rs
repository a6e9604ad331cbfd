use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::prep::orchestrator::Orchestrator;
use crate::prep::retry::RetryPolicy;
use crate::sheets::SheetsClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared connection pool for every outbound call.
    pub http: Client,
    pub orchestrator: Arc<Orchestrator>,
    pub retry: RetryPolicy,
    /// `None` when the Google Sheets variables are not all set.
    pub sheets: Option<SheetsClient>,
}

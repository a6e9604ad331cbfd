//! Axum route handlers for the Prep API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::prep::models::{PrepRequest, PrepResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepForm {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub company_url: String,
}

#[derive(Debug, Serialize)]
pub struct PrepResponse {
    pub result: PrepResult,
    pub retries: u32,
    /// Status lines emitted between attempts, oldest first.
    pub progress: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prep
///
/// Validates the form, then runs the orchestration under the retry policy.
/// Validation failures return before any outbound call.
pub async fn handle_prepare(
    State(state): State<AppState>,
    Json(form): Json<PrepForm>,
) -> Result<Json<PrepResponse>, AppError> {
    let request = PrepRequest::new(&form.job_description, &form.company_url)?;

    let submission = Uuid::new_v4();
    info!(
        %submission,
        "Submitting prep request: job_description_len={}, company_url={}",
        request.job_description.len(),
        request.company_url
    );

    let orchestrator = state.orchestrator.as_ref();
    let request = &request;
    let mut progress = Vec::new();

    let outcome = state
        .retry
        .run(
            |status| {
                info!(%submission, "{status}");
                progress.push(status.to_string());
            },
            || orchestrator.prepare(request),
        )
        .await?;

    Ok(Json(PrepResponse {
        result: outcome.value,
        retries: outcome.retries,
        progress,
    }))
}

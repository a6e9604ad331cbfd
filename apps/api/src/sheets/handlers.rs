//! Axum route handlers for email capture and sheets diagnostics.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::sheets::{check_connection, ConnectionReport, EmailRow, SheetsError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: String,
    #[serde(default)]
    pub role_category: String,
}

#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub success: bool,
}

/// Minimal shape check: something before an `@` and a dot somewhere after it.
pub fn validate_email(raw: &str) -> Result<&str, AppError> {
    let email = raw.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(email)
}

/// POST /api/v1/email
///
/// Appends the email and the role category of the generated prep to the sheet.
pub async fn handle_save_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<EmailResponse>, AppError> {
    let email = validate_email(&request.email)?;
    let sheets = state.sheets.as_ref().ok_or(SheetsError::NotConfigured)?;

    sheets
        .append_row(&EmailRow::new(email, request.role_category.trim()))
        .await?;

    Ok(Json(EmailResponse { success: true }))
}

/// GET /api/v1/sheets/check
pub async fn handle_check_connection(State(state): State<AppState>) -> Json<ConnectionReport> {
    Json(check_connection(&state.http, &state.config).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_and_trims() {
        assert_eq!(validate_email("  jane@example.com ").unwrap(), "jane@example.com");
    }

    #[test]
    fn test_validate_email_rejects_bad_shapes() {
        for bad in ["", "jane", "jane@example", "@example.com", "jane.example.com"] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}

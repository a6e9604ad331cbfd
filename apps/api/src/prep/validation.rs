//! Input validation for prep submissions.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide both a job description and company URL")]
    MissingFields,

    #[error("Please enter a valid URL (e.g., company.com or https://company.com)")]
    InvalidUrl,
}

/// Ensures the company URL carries an `http(s)` scheme.
///
/// `"acme.com"` becomes `"https://acme.com"`. Input that already parses as an
/// `http`/`https` URL is returned trimmed but otherwise as typed.
pub fn normalize_company_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") && has_host(&url) {
            return Ok(trimmed.to_string());
        }
    }

    let prefixed = format!("https://{trimmed}");
    match Url::parse(&prefixed) {
        Ok(url) if has_host(&url) => Ok(prefixed),
        _ => Err(ValidationError::InvalidUrl),
    }
}

fn has_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| !host.is_empty())
}

/// Bare domain for research prompts: host without a leading `www.`.
/// Falls back to the input when it cannot be parsed.
pub fn company_domain(company_url: &str) -> String {
    let trimmed = company_url.trim();
    Url::parse(trimmed)
        .ok()
        .filter(has_host)
        .or_else(|| Url::parse(&format!("https://{trimmed}")).ok())
        .and_then(|url| url.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

//! Request-scoped records produced while preparing one submission.

use serde::{Deserialize, Serialize};

use crate::llm_client::extract::{extract_json, extract_json_value, ParseError};
use crate::prep::validation::{normalize_company_url, ValidationError};

/// A validated submission. Construct with `PrepRequest::new`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepRequest {
    pub job_description: String,
    /// Always carries an `http` or `https` scheme.
    pub company_url: String,
}

impl PrepRequest {
    pub fn new(job_description: &str, company_url: &str) -> Result<Self, ValidationError> {
        let job_description = job_description.trim();
        if job_description.is_empty() || company_url.trim().is_empty() {
            return Err(ValidationError::MissingFields);
        }

        Ok(Self {
            job_description: job_description.to_string(),
            company_url: normalize_company_url(company_url)?,
        })
    }
}

/// Classification of the role behind a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAnalysis {
    #[serde(alias = "is_technical")]
    pub is_technical: bool,
    #[serde(alias = "role_category")]
    pub role_category: String,
    #[serde(default, alias = "key_skills")]
    pub key_skills: Vec<String>,
}

impl Default for RoleAnalysis {
    /// Unknown roles are treated as technical.
    fn default() -> Self {
        Self {
            is_technical: true,
            role_category: "unknown".to_string(),
            key_skills: Vec::new(),
        }
    }
}

impl RoleAnalysis {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        extract_json(raw)
    }

    pub fn kind(&self) -> &'static str {
        if self.is_technical {
            "technical"
        } else {
            "non-technical"
        }
    }
}

/// Aggregated research text and which backend produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyResearch {
    pub text: String,
    pub using_perplexity: bool,
}

/// One likely interview question with a coached answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQA {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(
        default,
        alias = "interviewerLooksFor",
        alias = "interviewer_looks_for",
        skip_serializing_if = "Option::is_none"
    )]
    pub interviewer_looking_for: Option<String>,
}

impl InterviewQA {
    fn generic(question: &str, answer: &str, tip: &str, looking_for: &str) -> Self {
        Self {
            question: question.to_string(),
            answer: answer.to_string(),
            tip: Some(tip.to_string()),
            interviewer_looking_for: Some(looking_for.to_string()),
        }
    }

    /// Parses the questions payload. Accepts a bare array or an object with a
    /// `questions` array. An empty list is an error so callers never show zero questions.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ParseError> {
        let value = extract_json_value(raw)?;
        let list = match value {
            serde_json::Value::Object(mut map) if map.contains_key("questions") => {
                map.remove("questions").unwrap_or_default()
            }
            other => other,
        };
        let questions: Vec<Self> = serde_json::from_value(list)?;
        if questions.is_empty() {
            return Err(ParseError::NoJson("question list was empty".to_string()));
        }
        Ok(questions)
    }

    /// Generic questions shown when the generated list cannot be parsed.
    pub fn fallback_list() -> Vec<Self> {
        vec![
            Self::generic(
                "Tell me about your experience with the skills mentioned in the job description.",
                "I would highlight my relevant experience with these skills, focusing on specific projects and achievements.",
                "Be specific about projects where you used these skills and quantify your impact.",
                "They want to see if you have practical experience with their requirements and can hit the ground running.",
            ),
            Self::generic(
                "How do you approach problem-solving in your work?",
                "I would describe my systematic approach to problem-solving, emphasizing analytical thinking and persistence.",
                "Share a specific example that demonstrates your problem-solving process from start to finish.",
                "They're evaluating your analytical thinking and how methodical you are in approaching complex problems.",
            ),
            Self::generic(
                "Can you describe a challenging project you worked on and how you overcame obstacles?",
                "I would share a specific example that demonstrates my skills, teamwork, and ability to overcome challenges.",
                "Use the STAR method (Situation, Task, Action, Result) to structure your response clearly.",
                "They want to assess your resilience, adaptability, and how you handle pressure.",
            ),
        ]
    }
}

/// The terminal artifact handed back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepResult {
    pub company_overview: String,
    pub role_requirements: String,
    pub potential_questions: Vec<InterviewQA>,
    pub role_category: String,
    pub using_perplexity: bool,
}

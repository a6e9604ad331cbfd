// Interview prep generation.
// Implements: input validation, role classification, company research with
// fallback chain, content generation, response normalization, client-side retry.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod research;
pub mod retry;
pub mod validation;

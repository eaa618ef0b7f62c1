// Retention intelligence: rule-based risk panel plus LLM-written retention copy.
// All LLM calls go through llm_client — no direct Ollama calls here.

pub mod cache;
pub mod generator;
pub mod handlers;
pub mod profile;
pub mod prompts;
pub mod risk;

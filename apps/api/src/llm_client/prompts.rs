// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Rules block that enforces JSON-only output from the model.
pub const JSON_ONLY_RULES: &str = "\
- Respond ONLY in valid JSON
- Do NOT add extra text
- Do NOT explain outside JSON";

/// Rules block that keeps customer-facing copy free of template artifacts.
pub const NO_PLACEHOLDERS_RULE: &str = "- Do NOT use placeholders like YOUR NAME or COMPANY NAME";

//! Retention Bundle Generation — turns a customer profile into three pieces of
//! retention copy via a single model call.
//!
//! Flow: build prompt → one chat call → parse JSON reply → normalize to bundle.
//!
//! Never fails. A backend error yields the unavailability sentinel; a reply that is
//! not a JSON object yields the parse-failure sentinel. Callers always get all three
//! fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::llm_client::prompts::{JSON_ONLY_RULES, NO_PLACEHOLDERS_RULE};
use crate::llm_client::{strip_json_fences, ChatBackend};
use crate::retention::profile::CustomerProfile;
use crate::retention::prompts::{RETENTION_PROMPT_TEMPLATE, SIGNATURE};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// The three-field result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionBundle {
    pub risk_explanation: String,
    pub retention_decision: String,
    pub customer_message: String,
}

impl RetentionBundle {
    fn new(explanation: &str, decision: &str, message: &str) -> Self {
        Self {
            risk_explanation: explanation.to_string(),
            retention_decision: decision.to_string(),
            customer_message: message.to_string(),
        }
    }

    /// Substituted when the backend call itself fails.
    pub fn unavailable() -> Self {
        Self::new(
            "AI system temporarily unavailable.",
            "No decision available.",
            "Thank you for your patience.",
        )
    }

    /// Substituted when the backend reply is not a JSON object.
    pub fn unparsable() -> Self {
        Self::new(
            "Unable to generate explanation at this time.",
            "No action recommended.",
            "Thank you for being a valued customer.",
        )
    }

    /// Builds a bundle from a parsed reply object. String fields pass through
    /// unchanged; missing or non-string fields take the parse-failure defaults.
    fn from_reply(mut object: Map<String, Value>) -> (Self, Vec<&'static str>) {
        let defaults = Self::unparsable();
        let mut defaulted = Vec::new();

        let mut take = |key: &'static str, fallback: String| match object.remove(key) {
            Some(Value::String(s)) => s,
            _ => {
                defaulted.push(key);
                fallback
            }
        };

        let bundle = Self {
            risk_explanation: take("risk_explanation", defaults.risk_explanation),
            retention_decision: take("retention_decision", defaults.retention_decision),
            customer_message: take("customer_message", defaults.customer_message),
        };

        (bundle, defaulted)
    }
}

/// Which path produced a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationOutcome {
    Generated,
    BackendUnavailable,
    Unparsable,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates a retention bundle for `profile`. Always returns a complete bundle.
///
/// Handlers use [`generate_with_outcome`] because the cache needs the outcome.
#[allow(dead_code)]
pub async fn generate(llm: &dyn ChatBackend, profile: &CustomerProfile) -> RetentionBundle {
    generate_with_outcome(llm, profile).await.0
}

/// Same as [`generate`], also reporting which path produced the bundle.
pub async fn generate_with_outcome(
    llm: &dyn ChatBackend,
    profile: &CustomerProfile,
) -> (RetentionBundle, GenerationOutcome) {
    let prompt = build_retention_prompt(profile);

    let raw_output = match llm.chat(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Retention LLM call failed, returning unavailable bundle: {e}");
            return (
                RetentionBundle::unavailable(),
                GenerationOutcome::BackendUnavailable,
            );
        }
    };

    match parse_reply(&raw_output) {
        Some(bundle) => {
            debug!("Retention bundle generated");
            (bundle, GenerationOutcome::Generated)
        }
        None => {
            warn!(
                "Retention LLM reply was not a JSON object: {:?}",
                raw_output.chars().take(80).collect::<String>()
            );
            (RetentionBundle::unparsable(), GenerationOutcome::Unparsable)
        }
    }
}

/// Parses the model's reply text. `None` means it is not a JSON object.
fn parse_reply(raw_output: &str) -> Option<RetentionBundle> {
    let text = strip_json_fences(raw_output);

    let object = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object,
        _ => return None,
    };

    let (bundle, defaulted) = RetentionBundle::from_reply(object);
    if !defaulted.is_empty() {
        warn!("Retention LLM reply missing string fields {defaulted:?}; defaulted");
    }
    Some(bundle)
}

/// Renders the prompt for `profile`. Pure: same profile, same text.
pub fn build_retention_prompt(profile: &CustomerProfile) -> String {
    RETENTION_PROMPT_TEMPLATE
        .replace("{json_only_rules}", JSON_ONLY_RULES)
        .replace("{no_placeholders_rule}", NO_PLACEHOLDERS_RULE)
        .replace("{signature}", SIGNATURE)
        .replace("{profile_json}", &profile.to_pretty_json())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmClient, LlmError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Backend stub that replies with a fixed result and records prompts.
    struct StubBackend {
        reply: Result<String, u16>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl StubBackend {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for StubBackend {
        async fn chat(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "backend down".to_string(),
                }),
            }
        }
    }

    fn profile() -> CustomerProfile {
        CustomerProfile::from_value(json!({
            "gender": "Male",
            "SeniorCitizen": false,
            "Partner": false,
            "Dependents": false,
            "tenure": 2,
            "MonthlyCharges": 95,
            "Contract": "Month-to-month",
            "SupportCalls": 4
        }))
        .unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_retention_prompt(&profile()), build_retention_prompt(&profile()));
    }

    #[test]
    fn test_prompt_embeds_profile_and_rules() {
        let prompt = build_retention_prompt(&profile());
        assert!(prompt.contains("senior customer retention strategist"));
        assert!(prompt.contains("Respond ONLY in valid JSON"));
        assert!(prompt.contains("Do NOT use placeholders like YOUR NAME or COMPANY NAME"));
        assert!(prompt.contains("ALWAYS sign the message as: Customer Success Team"));
        assert!(prompt.contains(&profile().to_pretty_json()));
        assert!(!prompt.contains("{profile_json}"));
        assert!(!prompt.contains("{signature}"));
    }

    #[test]
    fn test_prompt_does_not_expand_placeholders_inside_profile() {
        let profile = CustomerProfile::from_value(json!({"note": "{signature}"})).unwrap();
        let prompt = build_retention_prompt(&profile);
        assert!(prompt.contains("\"note\": \"{signature}\""));
    }

    #[tokio::test]
    async fn test_backend_failure_returns_unavailable_sentinel() {
        let backend = StubBackend::failing(500);
        let (bundle, outcome) = generate_with_outcome(&backend, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::BackendUnavailable);
        assert_eq!(
            serde_json::to_value(&bundle).unwrap(),
            json!({
                "risk_explanation": "AI system temporarily unavailable.",
                "retention_decision": "No decision available.",
                "customer_message": "Thank you for your patience."
            })
        );
    }

    #[tokio::test]
    async fn test_non_json_reply_returns_parse_failure_sentinel() {
        let backend = StubBackend::replying("not json at all");
        let (bundle, outcome) = generate_with_outcome(&backend, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::Unparsable);
        assert_eq!(
            serde_json::to_value(&bundle).unwrap(),
            json!({
                "risk_explanation": "Unable to generate explanation at this time.",
                "retention_decision": "No action recommended.",
                "customer_message": "Thank you for being a valued customer."
            })
        );
    }

    #[tokio::test]
    async fn test_empty_reply_returns_parse_failure_sentinel() {
        let backend = StubBackend::replying("");
        let bundle = generate(&backend, &profile()).await;
        assert_eq!(bundle, RetentionBundle::unparsable());
    }

    #[tokio::test]
    async fn test_json_non_object_reply_returns_parse_failure_sentinel() {
        for reply in ["[1, 2, 3]", "\"just a string\"", "42", "null"] {
            let backend = StubBackend::replying(reply);
            let (bundle, outcome) = generate_with_outcome(&backend, &profile()).await;
            assert_eq!(outcome, GenerationOutcome::Unparsable, "reply: {reply}");
            assert_eq!(bundle, RetentionBundle::unparsable());
        }
    }

    #[tokio::test]
    async fn test_valid_reply_passes_through_unchanged() {
        let backend = StubBackend::replying(
            r#"{"risk_explanation":"A","retention_decision":"B","customer_message":"C"}"#,
        );
        let (bundle, outcome) = generate_with_outcome(&backend, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::Generated);
        assert_eq!(bundle, RetentionBundle::new("A", "B", "C"));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_accepted() {
        let backend = StubBackend::replying(
            "```json\n{\"risk_explanation\":\"A\",\"retention_decision\":\"B\",\"customer_message\":\"C\"}\n```",
        );
        let bundle = generate(&backend, &profile()).await;
        assert_eq!(bundle, RetentionBundle::new("A", "B", "C"));
    }

    #[tokio::test]
    async fn test_missing_and_non_string_fields_are_defaulted() {
        let backend = StubBackend::replying(
            r#"{"risk_explanation":"A","retention_decision":7,"extra":"ignored"}"#,
        );
        let (bundle, outcome) = generate_with_outcome(&backend, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::Generated);
        assert_eq!(bundle.risk_explanation, "A");
        assert_eq!(bundle.retention_decision, "No action recommended.");
        assert_eq!(bundle.customer_message, "Thank you for being a valued customer.");
    }

    #[tokio::test]
    async fn test_exactly_one_backend_call_with_rendered_prompt() {
        let backend = StubBackend::failing(503);
        let _ = generate(&backend, &profile()).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            backend.last_prompt.lock().unwrap().as_deref(),
            Some(build_retention_prompt(&profile()).as_str())
        );
    }

    // ── Over the real Ollama client ──────────────────────────────────────────

    async fn ollama_returning(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_to_unavailable_sentinel() {
        let server = ollama_returning(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "message": {"role": "assistant", "content": "{}"},
                    "done": true
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .await;
        let client = LlmClient::new(server.uri(), Duration::from_millis(200)).unwrap();

        let (bundle, outcome) = generate_with_outcome(&client, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::BackendUnavailable);
        assert_eq!(bundle, RetentionBundle::unavailable());
    }

    #[tokio::test]
    async fn test_envelope_missing_content_returns_unavailable_sentinel() {
        let server = ollama_returning(ResponseTemplate::new(200).set_body_json(json!({
            "message": {"role": "assistant"},
            "done": true
        })))
        .await;
        let client = LlmClient::new(server.uri(), Duration::from_secs(5)).unwrap();

        let (bundle, outcome) = generate_with_outcome(&client, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::BackendUnavailable);
        assert_eq!(bundle, RetentionBundle::unavailable());
    }

    #[tokio::test]
    async fn test_real_client_passes_valid_reply_through() {
        let server = ollama_returning(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "role": "assistant",
                "content": "{\"risk_explanation\":\"A\",\"retention_decision\":\"B\",\"customer_message\":\"C\"}"
            },
            "done": true
        })))
        .await;
        let client = LlmClient::new(server.uri(), Duration::from_secs(5)).unwrap();

        let (bundle, outcome) = generate_with_outcome(&client, &profile()).await;

        assert_eq!(outcome, GenerationOutcome::Generated);
        assert_eq!(bundle, RetentionBundle::new("A", "B", "C"));
    }

    #[tokio::test]
    async fn test_empty_profile_still_yields_complete_bundle() {
        let backend = StubBackend::replying("{}");
        let bundle = generate(&backend, &CustomerProfile::default()).await;
        assert_eq!(bundle, RetentionBundle::unparsable());
    }
}

//! Axum route handlers for the Retention API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::retention::generator::{generate_with_outcome, GenerationOutcome, RetentionBundle};
use crate::retention::profile::{CustomerProfile, ProfileInput};
use crate::retention::risk::{assess_input, Playbook, RiskAssessment};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RiskResponse {
    pub risk: RiskAssessment,
    pub playbook: Playbook,
}

#[derive(Debug, Serialize)]
pub struct BundleResponse {
    pub bundle: RetentionBundle,
    pub outcome: GenerationOutcome,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub risk: RiskAssessment,
    pub playbook: Playbook,
    pub bundle: RetentionBundle,
    pub outcome: GenerationOutcome,
    pub cached: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/retention/risk
///
/// Rule-based risk panel only. No model call.
pub async fn handle_risk(
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<RiskResponse>, AppError> {
    let Json(input) = payload?;
    input.validate()?;

    let risk = assess_input(&input);
    let playbook = risk.level.playbook();

    Ok(Json(RiskResponse { risk, playbook }))
}

/// POST /api/v1/retention/bundle
///
/// Generates a bundle for an arbitrary JSON-object profile.
pub async fn handle_bundle(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BundleResponse>, AppError> {
    let Json(value) = payload?;
    let profile = CustomerProfile::from_value(value)?;

    let (bundle, outcome, cached) = cached_generate(&state, &profile).await;

    Ok(Json(BundleResponse {
        bundle,
        outcome,
        cached,
    }))
}

/// POST /api/v1/retention/analyze
///
/// Full pass over the intake form: risk panel, playbook and generated bundle.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(input) = payload?;
    input.validate()?;

    let risk = assess_input(&input);
    let playbook = risk.level.playbook();
    let profile = CustomerProfile::from(&input);

    let (bundle, outcome, cached) = cached_generate(&state, &profile).await;

    let analysis_id = Uuid::new_v4();
    info!(
        "Analysis {analysis_id}: risk={}, outcome={outcome:?}, cached={cached}",
        risk.label
    );

    Ok(Json(AnalyzeResponse {
        analysis_id,
        generated_at: Utc::now(),
        risk,
        playbook,
        bundle,
        outcome,
        cached,
    }))
}

/// Looks the profile up in the cache, generating on a miss.
/// Only successfully generated bundles are stored, so an outage is not memoized.
async fn cached_generate(
    state: &AppState,
    profile: &CustomerProfile,
) -> (RetentionBundle, GenerationOutcome, bool) {
    let key = profile.cache_key();

    if let Some(bundle) = state.cache.get(&key).await {
        return (bundle, GenerationOutcome::Generated, true);
    }

    let (bundle, outcome) = generate_with_outcome(state.llm.as_ref(), profile).await;

    if outcome == GenerationOutcome::Generated {
        state.cache.insert(key, bundle.clone()).await;
    }

    (bundle, outcome, false)
}

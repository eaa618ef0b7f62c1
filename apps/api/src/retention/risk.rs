//! Rule-based churn risk classifier and the retention playbook tied to each level.
//!
//! Deterministic, no LLM call. Thresholds:
//! - HIGH:   tenure ≤ 3 months AND monthly charges > 80
//! - MEDIUM: tenure ≤ 12 months
//! - LOW:    everything else

use serde::{Deserialize, Serialize};

use crate::retention::profile::ProfileInput;

const NEW_CUSTOMER_MAX_TENURE: u32 = 3;
const MEDIUM_RISK_MAX_TENURE: u32 = 12;
const HIGH_CHARGES_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

/// Rule-based decision and message for a risk level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playbook {
    pub decision: &'static str,
    pub detail: &'static str,
    pub message: &'static str,
}

impl RiskLevel {
    pub fn churn_probability(self) -> f64 {
        match self {
            RiskLevel::High => 0.92,
            RiskLevel::Medium => 0.55,
            RiskLevel::Low => 0.15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH RISK",
            RiskLevel::Medium => "MEDIUM RISK",
            RiskLevel::Low => "LOW RISK",
        }
    }

    pub fn playbook(self) -> Playbook {
        match self {
            RiskLevel::High => Playbook {
                decision: "Immediate retention intervention required.",
                detail: "Offer discounts, premium support, and contract upgrades.",
                message: "We value you! Enjoy a special discount and premium support.",
            },
            RiskLevel::Medium => Playbook {
                decision: "Preventive engagement recommended.",
                detail: "Provide value-added services.",
                message: "Unlock additional benefits at no extra cost.",
            },
            RiskLevel::Low => Playbook {
                decision: "No action required.",
                detail: "Customer is stable.",
                message: "Thank you for being a loyal customer.",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub label: &'static str,
    pub churn_probability: f64,
    /// Whole-number percentage for display.
    pub churn_percent: u32,
    pub reasons: Vec<&'static str>,
    pub explanation: String,
}

pub fn assess(
    tenure_months: u32,
    monthly_charges: f64,
    has_partner: bool,
    has_dependents: bool,
) -> RiskAssessment {
    let level = if tenure_months <= NEW_CUSTOMER_MAX_TENURE
        && monthly_charges > HIGH_CHARGES_THRESHOLD
    {
        RiskLevel::High
    } else if tenure_months <= MEDIUM_RISK_MAX_TENURE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut reasons = Vec::new();
    if tenure_months <= NEW_CUSTOMER_MAX_TENURE {
        reasons.push("the customer is very new");
    }
    if monthly_charges > HIGH_CHARGES_THRESHOLD {
        reasons.push("monthly charges are relatively high");
    }
    if !has_partner && !has_dependents {
        reasons.push("there are no family ties associated with the account");
    }

    let explanation = if reasons.is_empty() {
        "No strong churn indicators were detected.".to_string()
    } else {
        format!(
            "The model predicts churn risk because {}",
            reasons.join(", and ")
        )
    };

    let churn_probability = level.churn_probability();

    RiskAssessment {
        level,
        label: level.label(),
        churn_probability,
        churn_percent: (churn_probability * 100.0).round() as u32,
        reasons,
        explanation,
    }
}

/// Convenience wrapper over [`assess`] for the intake form.
pub fn assess_input(input: &ProfileInput) -> RiskAssessment {
    assess(
        input.tenure_months,
        input.monthly_charges,
        input.partner.is_yes(),
        input.dependents.is_yes(),
    )
}

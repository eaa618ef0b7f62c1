//! Customer profile — the opaque key-value input to bundle generation, plus the
//! typed form the presentation layer collects before converting to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Opaque customer attributes forwarded verbatim into the prompt.
///
/// Backed by `serde_json::Map`, which keeps keys sorted, so two profiles with the
/// same content always serialize to the same text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerProfile(Map<String, Value>);

impl CustomerProfile {
    /// Accepts any JSON value that is an object; rejects arrays and scalars.
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(AppError::Validation(format!(
                "customer profile must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Pretty-printed JSON with 2-space indentation, as embedded in the prompt.
    pub fn to_pretty_json(&self) -> String {
        // A Map<String, Value> always serializes.
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Compact serialized form, used as the memoization key for identical requests.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Yes/No answer as the intake form presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

/// Profile fields collected from the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    pub gender: String,
    pub senior_citizen: YesNo,
    pub partner: YesNo,
    pub dependents: YesNo,
    pub tenure_months: u32,
    pub monthly_charges: f64,
    #[serde(default)]
    pub contract_type: Option<String>,
    /// Support calls per month.
    #[serde(default)]
    pub support_calls: Option<u32>,
}

impl ProfileInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.monthly_charges.is_finite() || self.monthly_charges < 0.0 {
            return Err(AppError::Validation(
                "monthly_charges must be a non-negative number".to_string(),
            ));
        }
        if self.gender.trim().is_empty() {
            return Err(AppError::Validation("gender cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl From<&ProfileInput> for CustomerProfile {
    fn from(input: &ProfileInput) -> Self {
        let mut map = Map::new();
        map.insert("gender".into(), Value::from(input.gender.clone()));
        map.insert("SeniorCitizen".into(), Value::from(input.senior_citizen.is_yes()));
        map.insert("Partner".into(), Value::from(input.partner.is_yes()));
        map.insert("Dependents".into(), Value::from(input.dependents.is_yes()));
        map.insert("tenure".into(), Value::from(input.tenure_months));
        map.insert("MonthlyCharges".into(), Value::from(input.monthly_charges));
        if let Some(contract) = &input.contract_type {
            map.insert("Contract".into(), Value::from(contract.clone()));
        }
        if let Some(calls) = input.support_calls {
            map.insert("SupportCalls".into(), Value::from(calls));
        }
        CustomerProfile(map)
    }
}

pub mod routes;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use flag_evaluator::{EvaluationContext, Variant};

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub context: EvaluationContext,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub flags: BTreeMap<String, FlagState>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct FlagState {
    pub enabled: bool,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct VariantRequest {
    #[serde(default)]
    pub context: EvaluationContext,
    pub variants: Vec<Variant<serde_json::Value>>,
    pub default: serde_json::Value,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct VariantResponse {
    pub value: serde_json::Value,
    pub label: Option<String>,
}

// Checks that every label is present and distinct
pub fn validate_variant_labels(variants: &[Variant<serde_json::Value>]) -> Result<(), String> {
    for (i, variant) in variants.iter().enumerate() {
        if variant.label.is_empty() {
            return Err(format!("Variant at position {} has an empty label", i));
        }

        if variants[..i].iter().any(|v| v.label == variant.label) {
            return Err(format!("Variant label '{}' is repeated", variant.label));
        }
    }

    Ok(())
}

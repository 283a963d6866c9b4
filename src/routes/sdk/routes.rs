use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use flag_evaluator::{Evaluator, FlagDefinition, Variants};

use super::{
    validate_variant_labels, EvaluateRequest, EvaluateResponse, FlagState, VariantRequest,
    VariantResponse,
};
use crate::state::AppState;

/// List the loaded flag definitions
pub async fn list(State(state): State<AppState>) -> Json<Vec<FlagDefinition>> {
    Json(state.flags.iter().cloned().collect())
}

/// Evaluate all flags for the caller context
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Json<EvaluateResponse> {
    let evaluator = Evaluator::new(&state.flags);

    let flags = evaluator
        .evaluate_all(&request.context)
        .into_iter()
        .map(|(name, resolved)| {
            (
                name.to_string(),
                FlagState {
                    enabled: resolved.enabled,
                    reason: resolved.reason.to_string(),
                },
            )
        })
        .collect();

    tracing::debug!(
        caller = request.context.caller_id(),
        environment = request.context.environment(),
        "evaluated all flags"
    );

    Json(EvaluateResponse { flags })
}

/// Evaluate a single flag; unknown flags come back disabled, not 404
pub async fn evaluate_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<EvaluateRequest>,
) -> Json<FlagState> {
    let resolution = Evaluator::new(&state.flags).explain(&name, &request.context);

    Json(FlagState {
        enabled: resolution.enabled,
        reason: resolution.reason.to_string(),
    })
}

/// Pick the caller's variant from the table sent with the request
pub async fn variant(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<VariantRequest>,
) -> Result<Json<VariantResponse>, (StatusCode, String)> {
    validate_variant_labels(&request.variants).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let variants: Variants<serde_json::Value> = request
        .variants
        .into_iter()
        .map(|v| (v.label, v.value))
        .collect();

    let assignment =
        Evaluator::new(&state.flags).assign_variant(&name, &variants, &request.context);

    Ok(Json(VariantResponse {
        label: assignment.label().map(str::to_string),
        value: assignment.value_or(request.default),
    }))
}

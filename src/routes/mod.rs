use axum::{
    routing::{get, post},
    Router,
};

mod health;
mod sdk;

pub use health::health;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let sdk_router = Router::new()
        .route("/evaluate", post(sdk::routes::evaluate))
        .route("/flags", get(sdk::routes::list))
        .route("/flags/{name}", post(sdk::routes::evaluate_one))
        .route("/flags/{name}/variant", post(sdk::routes::variant));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/sdk", sdk_router)
}

async fn root() -> &'static str {
    "Feature flag evaluator"
}

use axum::{extract::State, routing::post, Json, Router};
use booking_core::seed::seed_demo_data;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/seed", post(seed))
}

/// Fill empty instructor and course collections with the demo catalogue.
async fn seed(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    seed_demo_data(state.store()).await?;
    Ok(Json(json!({ "status": "seeded" })))
}

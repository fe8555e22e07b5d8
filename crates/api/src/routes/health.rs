use axum::{extract::State, routing::get, Json, Router};
use booking_core::schema::HealthResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Connectivity check.
pub fn routes() -> Router<AppState> {
    Router::new().route("/test", get(test_connection))
}

/// Verifies the document store answers before reporting healthy.
async fn test_connection(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state.store().ping().await.map_err(|e| {
        ApiError::Unavailable(format!(
            "{} health check failed: {e}",
            state.store().backend()
        ))
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        database: "connected".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{get, test_app};

    #[tokio::test]
    async fn reports_connected_store() {
        let (app, _) = test_app();
        let (status, body) = get(app, "/test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "database": "connected"}));
    }
}

pub mod booking;
pub mod catalog;
pub mod health;
pub mod seed;

use axum::Router;

use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(seed::routes())
        .merge(catalog::routes())
        .merge(booking::routes())
        .with_state(state)
}

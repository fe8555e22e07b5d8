use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use booking_core::schema::{
    Booking, BookingResponse, BOOKING_COLLECTION, BOOKING_CONFIRMATION, BOOKING_FAILED,
};
use booking_core::store::records::create_record;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/book", post(book_course))
}

/// Store a booking request and acknowledge it.
async fn book_course(
    State(state): State<AppState>,
    payload: Result<Json<Booking>, JsonRejection>,
) -> ApiResult<Json<BookingResponse>> {
    let Json(booking) = payload?;
    booking.validate()?;

    let doc = create_record(state.store(), BOOKING_COLLECTION, &booking).await?;
    if doc.id.is_empty() {
        return Err(ApiError::Server(BOOKING_FAILED));
    }

    tracing::info!(booking_id = %doc.id, course = %booking.course, "Booking received");
    Ok(Json(BookingResponse {
        success: true,
        message: BOOKING_CONFIRMATION.to_string(),
        booking_id: Some(doc.id),
    }))
}

use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::AppJson;
use crate::api::dtos::requests::CreatePaymentRequest;
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(booking_id): Path<String>,
    AppJson(payload): AppJson<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.payment_service
        .initiate(&caller, &booking_id, payload.payment_method)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(payment)))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (booking, _) = state.booking_service.get_visible(&caller, &booking_id).await?;
    let payment = state.payment_repo.find_by_booking(&booking.id).await?
        .ok_or(AppError::NotFound("No payment for this booking".into()))?;
    Ok(Json(payment))
}

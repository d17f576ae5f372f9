use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::AppJson;
use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::BookingDetailsResponse;
use crate::error::AppError;
use chrono::Utc;
use std::sync::Arc;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(property_id): Path<String>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service
        .create(&caller, &property_id, payload.start_date, payload.end_date, Utc::now().date_naive())
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_repo.list_by_guest(&caller.id).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (booking, _) = state.booking_service.get_visible(&caller, &booking_id).await?;
    let payment = state.payment_repo.find_by_booking(&booking.id).await?;

    Ok(Json(BookingDetailsResponse {
        nights: booking.nights(),
        booking,
        payment,
    }))
}

pub async fn list_property_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.booking_service.list_for_property(&caller, &property_id).await?;
    Ok(Json(bookings))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.booking_service
        .cancel(&caller, &booking_id, Utc::now().date_naive())
        .await?;
    Ok(Json(booking))
}

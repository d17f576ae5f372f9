use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::AppJson;
use crate::api::dtos::requests::CreateReviewRequest;
use crate::domain::models::review::Review;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(property_id): Path<String>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let review = Review::new(property_id, caller.id.clone(), payload.rating, payload.comment.trim().to_string())?;

    let property = state.property_repo.find_by_id(&review.property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;

    if !state.booking_repo.has_confirmed_stay(&property.id, &caller.id).await? {
        return Err(AppError::Forbidden("Only guests with a confirmed booking can review".into()));
    }

    let created = state.review_repo.create(&review).await?;
    info!("Review {} ({} stars) on property {}", created.id, created.rating, property.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let property = state.property_repo.find_by_id(&property_id).await?
        .ok_or(AppError::NotFound("Property not found".into()))?;
    let reviews = state.review_repo.list_by_property(&property.id).await?;
    Ok(Json(reviews))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(review_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let review = state.review_repo.find_by_id(&review_id).await?
        .ok_or(AppError::NotFound("Review not found".into()))?;

    if review.user_id != caller.id && !caller.is_admin() {
        return Err(AppError::Forbidden("Only the author can delete this review".into()));
    }

    state.review_repo.delete(&review.id).await?;
    info!("Deleted review {}", review.id);
    Ok(StatusCode::NO_CONTENT)
}

use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::AppJson;
use crate::api::dtos::requests::UpdateProfileRequest;
use crate::domain::models::auth::UserProfile;
use crate::domain::services::auth_service::AuthService;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&caller.id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(UserProfile::from(user)))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut user = state.user_repo.find_by_id(&caller.id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if let Some(name) = payload.name {
        user.name = name.trim().to_string();
    }
    if let Some(password) = payload.password {
        user.password_hash = AuthService::hash_password(&password)?;
    }

    let updated = state.user_repo.update_profile(&user).await?;
    info!("Updated profile of user {}", updated.id);
    Ok(Json(UserProfile::from(updated)))
}

pub async fn get_public_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    Ok(Json(user.public_profile()))
}

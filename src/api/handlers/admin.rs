use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::{AppJson, AppQuery};
use crate::api::dtos::requests::{PageQuery, UpdateRoleRequest};
use crate::domain::models::{auth::{Principal, UserProfile}, property::DEFAULT_SEARCH_LIMIT, user::Role};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

fn require_admin(caller: &Principal) -> Result<(), AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }
    Ok(())
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    AppQuery(page): AppQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;
    page.validate()?;

    let users = state.user_repo
        .list(page.limit.unwrap_or(DEFAULT_SEARCH_LIMIT), page.offset.unwrap_or(0))
        .await?;

    Ok(Json(users.into_iter().map(UserProfile::from).collect::<Vec<_>>()))
}

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_admin(&caller)?;

    if user_id == caller.id && payload.role != Role::Admin {
        return Err(AppError::Conflict("Admins cannot demote themselves".into()));
    }

    let updated = state.user_repo.update_role(&user_id, payload.role).await?;
    info!("User {} role set to {} by {}", updated.id, updated.role, caller.id);
    Ok(Json(UserProfile::from(updated)))
}

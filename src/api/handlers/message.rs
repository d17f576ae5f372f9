use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::extractors::body::AppJson;
use crate::api::dtos::requests::SendMessageRequest;
use crate::domain::models::message::Message;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.message_body.trim().is_empty() {
        return Err(AppError::Validation("message_body cannot be empty".into()));
    }
    if payload.recipient_id == caller.id {
        return Err(AppError::Validation("Cannot send a message to yourself".into()));
    }

    let recipient = state.user_repo.find_by_id(&payload.recipient_id).await?
        .ok_or(AppError::NotFound("Recipient not found".into()))?;

    let message = Message::new(caller.id.clone(), recipient.id, payload.message_body);
    let created = state.message_repo.create(&message).await?;

    info!("Message {} from {} to {}", created.id, created.sender_id, created.recipient_id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_inbox(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.message_repo.list_inbox(&caller.id).await?;
    Ok(Json(messages))
}

pub async fn list_conversation(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(other_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let messages = state.message_repo.list_conversation(&caller.id, &other_id).await?;
    Ok(Json(messages))
}

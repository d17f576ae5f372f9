use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::api::extractors::body::AppJson;
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RegisterRequest};
use crate::domain::models::auth::{AuthResponse, UserProfile};
use crate::domain::models::user::{normalize_email, Role, User};
use crate::domain::services::auth_service::{AuthService, ACCESS_TOKEN_MINUTES, REFRESH_TOKEN_DAYS};
use std::sync::Arc;
use tower_cookies::{Cookies, Cookie};
use tower_cookies::cookie::SameSite;
use time::Duration;
use tracing::info;
use validator::Validate;

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = payload.role.unwrap_or(Role::Guest);
    if role == Role::Admin {
        return Err(AppError::Forbidden("Admin accounts cannot be self-registered".into()));
    }

    let email = normalize_email(&payload.email);
    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = AuthService::hash_password(&payload.password)?;
    let user = User::new(payload.name.trim().to_string(), &email, password_hash, role);
    let created = state.user_repo.create(&user).await?;

    info!("Registered {} user {}", created.role, created.id);

    Ok((StatusCode::CREATED, Json(UserProfile::from(created))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_email(&normalize_email(&payload.email)).await?
        .ok_or(AppError::Unauthorized)?;

    AuthService::verify_password(&payload.password, &user.password_hash)?;

    let (access_jwt, refresh_token, csrf_token) = state.auth_service.login(&user).await?;

    set_cookies(&cookies, &access_jwt, &refresh_token);

    info!("User logged in: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token,
        user: UserProfile::from(user),
    }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let refresh_cookie = cookies.get("refresh_token").ok_or(AppError::Unauthorized)?;
    let raw_token = refresh_cookie.value();

    let token_hash = state.auth_service.hash_token(raw_token);
    let record = state.auth_repo.find_refresh_token(&token_hash).await?
        .ok_or(AppError::Unauthorized)?;

    let user = state.user_repo.find_by_id(&record.user_id).await?
        .ok_or(AppError::Unauthorized)?;

    let (new_access, new_refresh, new_csrf) = state.auth_service.refresh(raw_token, &user).await?;

    set_cookies(&cookies, &new_access, &new_refresh);

    info!("Token refreshed for user: {}", user.id);

    Ok(Json(AuthResponse {
        csrf_token: new_csrf,
        user: UserProfile::from(user),
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = cookies.get("refresh_token") {
        let _ = state.auth_service.logout(cookie.value()).await;
    }

    cookies.remove(Cookie::build(("access_token", "")).path("/").into());
    cookies.remove(Cookie::build(("refresh_token", "")).path("/").into());

    info!("User logged out");

    Ok(StatusCode::OK)
}

fn set_cookies(cookies: &Cookies, access: &str, refresh: &str) {
    cookies.add(session_cookie("access_token", access, Duration::minutes(ACCESS_TOKEN_MINUTES)));
    cookies.add(session_cookie("refresh_token", refresh, Duration::days(REFRESH_TOKEN_DAYS)));
}

fn session_cookie(name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value.to_string());
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(max_age);
    cookie
}

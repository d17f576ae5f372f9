use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, Method, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::Principal;
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::Span;

pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// The caller behind the `access_token` cookie. Unsafe methods must also echo
/// the token's CSRF claim in `X-CSRF-Token`.
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        let access_token = cookies.get("access_token")
            .ok_or(StatusCode::UNAUTHORIZED)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let claims = app_state.auth_service.verify_access_token(&access_token)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        if !matches!(parts.method, Method::GET | Method::HEAD | Method::OPTIONS) {
            let csrf_header_val = parts.headers.get(CSRF_HEADER)
                .ok_or(StatusCode::FORBIDDEN)?
                .to_str()
                .map_err(|_| StatusCode::FORBIDDEN)?;

            if csrf_header_val != claims.csrf_token {
                return Err(StatusCode::FORBIDDEN);
            }
        }

        Span::current().record("user_id", claims.sub.as_str());

        Ok(AuthUser(Principal {
            id: claims.sub,
            role: claims.role,
        }))
    }
}

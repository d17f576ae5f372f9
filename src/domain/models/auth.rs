use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::user::{Role, User};

pub const ACCESS_TOKEN_AUDIENCE: &str = "stay-frontend";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,

    #[serde(rename = "https://stay.local/claims/role")]
    pub role: Role,

    #[serde(rename = "https://stay.local/claims/csrf")]
    pub csrf_token: String,
}

/// The authenticated caller as decoded from the access token.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

#[derive(Debug, FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: String,
    pub family_id: Uuid,
    pub generation_id: i32,
    pub expires_at: DateTime<Utc>,
    /// Set once the token has been rotated; a later presentation is a replay.
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub csrf_token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

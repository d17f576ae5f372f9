use std::sync::Arc;
use crate::domain::{
    models::{auth::{Claims, RefreshTokenRecord, ACCESS_TOKEN_AUDIENCE}, user::User},
    ports::AuthRepository
};
use crate::error::AppError;
use crate::config::Config;
use argon2::{password_hash::{SaltString, PasswordHash, PasswordHasher, PasswordVerifier}, Argon2};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use chrono::{Utc, Duration};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Sha256, Digest};

pub const ACCESS_TOKEN_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

/// Issued on login and refresh: (access JWT, raw refresh token, CSRF token).
pub type TokenPair = (String, String, String);

pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    config: Config,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, config: Config) -> Result<Self, AppError> {
        let encoding_key = EncodingKey::from_ed_pem(config.jwt_secret_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT private key PEM: {}", e)))?;
        let decoding_key = DecodingKey::from_ed_pem(config.jwt_public_key.as_bytes())
            .map_err(|e| AppError::InternalWithMsg(format!("Invalid JWT public key PEM: {}", e)))?;

        Ok(Self { repo, config, encoding_key, decoding_key })
    }

    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AppError::Internal)
    }

    pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|_| AppError::Internal)?;

        Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AppError::Unauthorized)
    }

    pub async fn login(&self, user: &User) -> Result<TokenPair, AppError> {
        let family_id = Uuid::new_v4();
        self.issue_token_pair(user, family_id, 1).await
    }

    pub async fn refresh(&self, raw_refresh_token: &str, user: &User) -> Result<TokenPair, AppError> {
        let token_hash = self.hash_token(raw_refresh_token);

        let record = self.repo.find_refresh_token(&token_hash).await?
            .ok_or(AppError::Unauthorized)?;

        let now = Utc::now();
        if record.expires_at < now {
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        // A spent token coming back means it leaked; revoke the whole login.
        if record.used_at.is_some() || !self.repo.mark_refresh_token_used(&token_hash, now).await? {
            tracing::warn!(
                "Refresh token replay for user {} (family {}, generation {}); revoking family",
                record.user_id, record.family_id, record.generation_id
            );
            self.repo.delete_refresh_family(record.family_id).await?;
            return Err(AppError::Unauthorized);
        }

        self.issue_token_pair(user, record.family_id, record.generation_id + 1).await
    }

    /// Ends the login the token belongs to, every generation included.
    pub async fn logout(&self, raw_refresh_token: &str) -> Result<(), AppError> {
        let token_hash = self.hash_token(raw_refresh_token);
        if let Some(record) = self.repo.find_refresh_token(&token_hash).await? {
            self.repo.delete_refresh_family(record.family_id).await?;
        }
        Ok(())
    }

    async fn issue_token_pair(&self, user: &User, family_id: Uuid, generation_id: i32) -> Result<TokenPair, AppError> {
        let csrf_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let now = Utc::now();
        let exp = (now + Duration::minutes(ACCESS_TOKEN_MINUTES)).timestamp() as usize;

        let claims = Claims {
            iss: self.config.auth_issuer.clone(),
            sub: user.id.clone(),
            aud: ACCESS_TOKEN_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
            role: user.role,
            csrf_token: csrf_token.clone(),
        };

        let access_token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(|e| {
                tracing::error!("JWT encoding failed: {}", e);
                AppError::Internal
            })?;

        let refresh_token: String = rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        let refresh_token_hash = self.hash_token(&refresh_token);

        let refresh_record = RefreshTokenRecord {
            token_hash: refresh_token_hash,
            user_id: user.id.clone(),
            family_id,
            generation_id,
            expires_at: now + Duration::days(REFRESH_TOKEN_DAYS),
            used_at: None,
            created_at: now,
        };

        self.repo.create_refresh_token(&refresh_record).await?;
        Ok((access_token, refresh_token, csrf_token))
    }

    /// Checks signature, expiry, audience and issuer of an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
        validation.set_issuer(&[self.config.auth_issuer.as_str()]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    pub fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

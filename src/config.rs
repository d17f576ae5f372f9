use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub payment_gateway_url: String,
    pub payment_gateway_token: String,
    pub jwt_secret_key: String, // Ed25519 private key (PEM)
    pub jwt_public_key: String, // Ed25519 public key (PEM)
    pub auth_issuer: String,
    pub job_poll_interval_secs: u64,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8100/api/v1/charges".to_string()),
            payment_gateway_token: env::var("PAYMENT_GATEWAY_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.stay.local".to_string()),
            job_poll_interval_secs: env::var("JOB_POLL_INTERVAL_SECS").ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        }
    }
}

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::state::{AppState, Repositories};
use crate::domain::models::user::{normalize_email, Role, User};
use crate::domain::services::auth_service::AuthService;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::payment::http_payment_gateway::HttpPaymentGateway;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_job_repo::PostgresJobRepo, postgres_message_repo::PostgresMessageRepo,
    postgres_payment_repo::PostgresPaymentRepo, postgres_property_repo::PostgresPropertyRepo,
    postgres_review_repo::PostgresReviewRepo, postgres_user_repo::PostgresUserRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_booking_repo::SqliteBookingRepo,
    sqlite_job_repo::SqliteJobRepo, sqlite_message_repo::SqliteMessageRepo,
    sqlite_payment_repo::SqlitePaymentRepo, sqlite_property_repo::SqlitePropertyRepo,
    sqlite_review_repo::SqliteReviewRepo, sqlite_user_repo::SqliteUserRepo,
};

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth: Arc::new(SqliteAuthRepo::new(pool.clone())),
            properties: Arc::new(SqlitePropertyRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            payments: Arc::new(SqlitePaymentRepo::new(pool.clone())),
            reviews: Arc::new(SqliteReviewRepo::new(pool.clone())),
            messages: Arc::new(SqliteMessageRepo::new(pool.clone())),
            jobs: Arc::new(SqliteJobRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth: Arc::new(PostgresAuthRepo::new(pool.clone())),
            properties: Arc::new(PostgresPropertyRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            payments: Arc::new(PostgresPaymentRepo::new(pool.clone())),
            reviews: Arc::new(PostgresReviewRepo::new(pool.clone())),
            messages: Arc::new(PostgresMessageRepo::new(pool.clone())),
            jobs: Arc::new(PostgresJobRepo::new(pool)),
        }
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let payment_gateway = Arc::new(
        HttpPaymentGateway::new(config.payment_gateway_url.clone(), config.payment_gateway_token.clone())
            .expect("Failed to build payment gateway client"),
    );

    let state = AppState::new(config.clone(), repos, email_service, payment_gateway)
        .expect("Failed to assemble application state");

    if let Err(e) = ensure_admin(&state).await {
        warn!("Admin bootstrap skipped: {}", e);
    }

    state
}

/// Creates the configured admin account on first start, or promotes an existing user.
pub async fn ensure_admin(state: &AppState) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password) else {
        return Ok(());
    };

    match state.user_repo.find_by_email(&normalize_email(email)).await? {
        Some(user) if user.role == Role::Admin => Ok(()),
        Some(user) => {
            state.user_repo.update_role(&user.id, Role::Admin).await?;
            info!("Promoted {} to admin", user.email);
            Ok(())
        }
        None => {
            let hash = AuthService::hash_password(password)?;
            let admin = state.user_repo.create(&User::new("Administrator".into(), email, hash, Role::Admin)).await?;
            info!("Created admin account {}", admin.email);
            Ok(())
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

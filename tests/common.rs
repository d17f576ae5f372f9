#![allow(dead_code)]

use stay_backend::{
    api::router::create_router,
    background::run_pending_jobs,
    config::Config,
    domain::models::payment::{ChargeOutcome, ChargeRequest},
    domain::models::user::{Role, User},
    domain::ports::{EmailService, PaymentGateway},
    domain::services::auth_service::AuthService,
    error::AppError,
    state::{AppState, Repositories},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, header},
    response::Response,
    Router,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tower::ServiceExt;
use serde_json::{json, Value};

pub const PASSWORD: &str = "correct-horse-42";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Approves every charge until told otherwise.
pub struct MockPaymentGateway {
    approve: AtomicBool,
    pub charges: Mutex<Vec<ChargeRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self { approve: AtomicBool::new(true), charges: Mutex::new(Vec::new()) }
    }

    pub fn set_approve(&self, approve: bool) {
        self.approve.store(approve, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, AppError> {
        self.charges.lock().unwrap().push(request.clone());
        if self.approve.load(Ordering::SeqCst) {
            Ok(ChargeOutcome::Approved { reference: format!("ch_{}", request.payment_id) })
        } else {
            Ok(ChargeOutcome::Declined { reason: "card_declined".to_string() })
        }
    }
}

pub struct AuthHeaders {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub csrf_token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub gateway: Arc<MockPaymentGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            payment_gateway_url: "http://localhost".to_string(),
            payment_gateway_token: "token".to_string(),
            jwt_secret_key: include_str!("../tests/keys/test_private.pem").to_string(),
            jwt_public_key: include_str!("../tests/keys/test_public.pem").to_string(),
            auth_issuer: "test-issuer".to_string(),
            job_poll_interval_secs: 1,
            admin_email: None,
            admin_password: None,
        };

        let email = Arc::new(MockEmailService::default());
        let gateway = Arc::new(MockPaymentGateway::new());

        let state = Arc::new(
            AppState::new(config, Repositories::sqlite(pool.clone()), email.clone(), gateway.clone())
                .expect("Failed to build app state"),
        );

        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, email, gateway }
    }

    /// Runs the worker once, the way the background loop would.
    pub async fn run_jobs(&self) -> usize {
        run_pending_jobs(&self.state).await
    }

    pub async fn send(&self, method: &str, uri: &str, auth: Option<&AuthHeaders>, body: Option<Value>) -> Response {
        match auth {
            Some(auth) => {
                let cookie = format!("access_token={}", auth.access_token);
                self.send_with_cookie(method, uri, Some(&cookie), Some(&auth.csrf_token), body).await
            }
            None => self.send_with_cookie(method, uri, None, None, body).await,
        }
    }

    pub async fn send_with_cookie(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        csrf_token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(csrf_token) = csrf_token {
            builder = builder.header("X-CSRF-Token", csrf_token);
        }

        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    pub async fn register(&self, name: &str, email: &str, role: &str) -> Response {
        self.send("POST", "/api/v1/auth/register", None, Some(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "role": role
        }))).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthHeaders {
        let response = self.send("POST", "/api/v1/auth/login", None, Some(json!({
            "email": email,
            "password": password
        }))).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = cookie_value(&response, "access_token").expect("No access_token cookie returned");

        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();
        let user_id = body_json["user"]["id"].as_str().unwrap().to_string();

        AuthHeaders {
            user_id,
            email: email.to_string(),
            access_token,
            csrf_token,
        }
    }

    /// Registers a fresh account with the given role and logs it in.
    pub async fn signup(&self, role: &str) -> AuthHeaders {
        let email = format!("{}-{}@example.com", role, Uuid::new_v4().simple());
        let response = self.register(role, &email, role).await;
        assert_eq!(response.status(), 201, "register failed for {}", email);
        self.login(&email, PASSWORD).await
    }

    pub async fn admin(&self) -> AuthHeaders {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        let hash = AuthService::hash_password(PASSWORD).unwrap();
        self.state.user_repo
            .create(&User::new("Admin".into(), &email, hash, Role::Admin))
            .await
            .unwrap();
        self.login(&email, PASSWORD).await
    }

    pub async fn create_property(&self, host: &AuthHeaders, location: &str, price_per_night: i64) -> String {
        let response = self.send("POST", "/api/v1/properties", Some(host), Some(json!({
            "title": format!("Stay in {}", location),
            "description": "Quiet and bright",
            "location": location,
            "price_per_night": price_per_night
        }))).await;
        assert_eq!(response.status(), 201);
        parse_body(response).await["id"].as_str().unwrap().to_string()
    }

    pub async fn book(&self, guest: &AuthHeaders, property_id: &str, start: NaiveDate, end: NaiveDate) -> Response {
        self.send(
            "POST",
            &format!("/api/v1/properties/{}/bookings", property_id),
            Some(guest),
            Some(json!({ "start_date": start, "end_date": end })),
        ).await
    }

    pub async fn pay(&self, guest: &AuthHeaders, booking_id: &str, method: &str) -> Response {
        self.send(
            "POST",
            &format!("/api/v1/bookings/{}/payment", booking_id),
            Some(guest),
            Some(json!({ "payment_method": method })),
        ).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| {
            let value = &c[prefix.len()..];
            value.split(';').next().unwrap_or_default().to_string()
        })
}

/// A date `offset` days from today, so stays are never in the past.
pub fn day(offset: i64) -> NaiveDate {
    Utc::now().date_naive() + chrono::Duration::days(offset)
}

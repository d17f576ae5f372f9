use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors.to_string().replace('\n', "; "))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

// 2067 = SQLite unique, 1555 = SQLite primary key, 23505 = PostgreSQL unique violation
const UNIQUE_VIOLATION_CODES: [&str; 3] = ["2067", "1555", "23505"];
// 1811 = SQLite RAISE(ABORT) from the booking overlap triggers, 23P01 = PostgreSQL exclusion violation
const OVERLAP_VIOLATION_CODES: [&str; 2] = ["1811", "23P01"];
// 787 = SQLite foreign key, 23503 = PostgreSQL foreign key violation
const FOREIGN_KEY_VIOLATION_CODES: [&str; 2] = ["787", "23503"];

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    if UNIQUE_VIOLATION_CODES.contains(&code.as_ref()) {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                    if OVERLAP_VIOLATION_CODES.contains(&code.as_ref()) {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Requested dates overlap an existing booking" }))
                        ).into_response();
                    }
                    if FOREIGN_KEY_VIOLATION_CODES.contains(&code.as_ref()) {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": "Referenced resource does not exist" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const JOB_PROCESS_PAYMENT: &str = "PROCESS_PAYMENT";
pub const JOB_BOOKING_CONFIRMED: &str = "BOOKING_CONFIRMED";
pub const JOB_BOOKING_CANCELED: &str = "BOOKING_CANCELED";

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_PROCESSING: &str = "PROCESSING";
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const STATUS_FAILED: &str = "FAILED";
pub const STATUS_CANCELLED: &str = "CANCELLED";

/// How long a claimed job may stay PROCESSING before another worker may claim it again.
pub const CLAIM_LEASE_SECS: i64 = 300;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobPayload {
    pub booking_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Job {
    pub id: String,
    pub job_type: String,
    pub payload: Json<JobPayload>,
    pub execute_at: DateTime<Utc>,
    pub status: String,
    pub error_message: Option<String>,
    /// When the current claim was taken; `None` until first claimed.
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: &str, booking_id: String, execute_at: DateTime<Utc>) -> Self {
        Self::with_payload(job_type, JobPayload { booking_id, payment_id: None }, execute_at)
    }

    pub fn for_payment(booking_id: String, payment_id: String) -> Self {
        Self::with_payload(
            JOB_PROCESS_PAYMENT,
            JobPayload { booking_id, payment_id: Some(payment_id) },
            Utc::now(),
        )
    }

    fn with_payload(job_type: &str, payload: JobPayload, execute_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_type: job_type.to_string(),
            payload: Json(payload),
            execute_at,
            status: STATUS_PENDING.to_string(),
            error_message: None,
            locked_at: None,
            created_at: Utc::now(),
        }
    }
}

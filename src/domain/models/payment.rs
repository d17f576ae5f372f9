use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Paypal,
    Stripe,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// One per booking. `payment_date` is stamped when the payment settles either way.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn pending(booking_id: String, amount: i64, payment_method: PaymentMethod) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            amount,
            payment_method,
            status: PaymentStatus::Pending,
            payment_date: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChargeRequest {
    pub payment_id: String,
    pub booking_id: String,
    pub amount: i64,
    pub payment_method: PaymentMethod,
}

impl From<&Payment> for ChargeRequest {
    fn from(payment: &Payment) -> Self {
        Self {
            payment_id: payment.id.clone(),
            booking_id: payment.booking_id.clone(),
            amount: payment.amount,
            payment_method: payment.payment_method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

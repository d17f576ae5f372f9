use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
}

/// A stay over `[start_date, end_date)`. The check-out day is not a night.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub property_id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub property_id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_price: i64,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            property_id: params.property_id,
            user_id: params.user_id,
            start_date: params.start_date,
            end_date: params.end_date,
            total_price: params.total_price,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Non-canceled bookings hold their dates.
    pub fn blocks_dates(&self) -> bool {
        self.status != BookingStatus::Canceled
    }

    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq, Eq)]
pub struct BlockedRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&Booking> for BlockedRange {
    fn from(booking: &Booking) -> Self {
        Self { start_date: booking.start_date, end_date: booking.end_date }
    }
}

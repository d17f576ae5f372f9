use crate::domain::models::booking::{BlockedRange, Booking};
use crate::domain::models::payment::Payment;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub property_id: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub blocked: Vec<BlockedRange>,
}

/// A booking together with its payment, if one was started.
#[derive(Serialize)]
pub struct BookingDetailsResponse {
    #[serde(flatten)]
    pub booking: Booking,
    pub nights: i64,
    pub payment: Option<Payment>,
}

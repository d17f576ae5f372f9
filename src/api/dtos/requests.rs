use crate::domain::models::{
    payment::PaymentMethod,
    property::{PropertySearch, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT},
    user::Role,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Deserialize, Validate)]
pub struct PageQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(range(min = 1))]
    pub price_per_night: i64,
}

#[derive(Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[validate(range(min = 1))]
    pub price_per_night: Option<i64>,
}

#[derive(Deserialize, Validate)]
pub struct PropertySearchQuery {
    pub location: Option<String>,
    #[validate(range(min = 0))]
    pub min_price: Option<i64>,
    #[validate(range(min = 0))]
    pub max_price: Option<i64>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub host_id: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl From<PropertySearchQuery> for PropertySearch {
    fn from(q: PropertySearchQuery) -> Self {
        Self {
            location: q.location,
            min_price: q.min_price,
            max_price: q.max_price,
            check_in: q.check_in,
            check_out: q.check_out,
            host_id: q.host_id,
            limit: q.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT),
            offset: q.offset.unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct CreatePaymentRequest {
    pub payment_method: PaymentMethod,
}

#[derive(Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

#[derive(Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    pub recipient_id: String,
    #[validate(length(min = 1, max = 5000))]
    pub message_body: String,
}

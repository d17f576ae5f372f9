use crate::domain::models::{
    user::{Role, User}, property::{Property, PropertySearch, ReviewSummary},
    booking::Booking, payment::{Payment, ChargeRequest, ChargeOutcome},
    review::Review, message::Message, job::Job, auth::RefreshTokenRecord,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;
    async fn update_profile(&self, user: &User) -> Result<User, AppError>;
    async fn update_role(&self, id: &str, role: Role) -> Result<User, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Stamps `used_at` on an unused token. `false` means it was already spent.
    async fn mark_refresh_token_used(&self, token_hash: &str, now: DateTime<Utc>) -> Result<bool, AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(&self, property: &Property) -> Result<Property, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, AppError>;
    async fn search(&self, search: &PropertySearch) -> Result<Vec<Property>, AppError>;
    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Property>, AppError>;
    async fn update(&self, property: &Property) -> Result<Property, AppError>;
    /// Fails with `Conflict` while a non-canceled booking ends after `today`.
    async fn delete(&self, id: &str, today: NaiveDate) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Locks the property, re-checks for overlapping non-canceled bookings and
    /// inserts, all in one transaction.
    async fn create_exclusive(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_guest(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_by_property(&self, property_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list_blocking(&self, property_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError>;
    /// Cancels the booking, its pending jobs and pending payment, and enqueues `jobs`.
    async fn cancel(&self, booking: &Booking, jobs: Vec<Job>) -> Result<Booking, AppError>;
    async fn has_confirmed_stay(&self, property_id: &str, user_id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts or resets the booking's single payment row and enqueues `job`.
    async fn upsert_pending(&self, payment: &Payment, job: &Job) -> Result<Payment, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError>;
    async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Payment>, AppError>;
    async fn mark_failed(&self, id: &str) -> Result<Payment, AppError>;
    /// Completes the payment and confirms its pending booking atomically.
    async fn complete(&self, payment: &Payment, jobs: Vec<Job>) -> Result<Payment, AppError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, review: &Review) -> Result<Review, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, AppError>;
    async fn list_by_property(&self, property_id: &str) -> Result<Vec<Review>, AppError>;
    async fn summary(&self, property_id: &str) -> Result<ReviewSummary, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &Message) -> Result<Message, AppError>;
    async fn list_inbox(&self, user_id: &str) -> Result<Vec<Message>, AppError>;
    async fn list_conversation(&self, user_id: &str, other_id: &str) -> Result<Vec<Message>, AppError>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Claims up to `limit` due jobs, plus PROCESSING jobs whose claim is older than `lease`.
    async fn find_pending(&self, limit: i32, lease: Duration) -> Result<Vec<Job>, AppError>;
    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError>;
    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<Job>, AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError>;
}

/// The external payment processor. Transport failures are errors, declines are not.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, AppError>;
}

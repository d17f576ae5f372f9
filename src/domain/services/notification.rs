use std::sync::Arc;
use tera::{Context, Tera};
use tracing::info;
use crate::domain::models::job::{JOB_BOOKING_CANCELED, JOB_BOOKING_CONFIRMED};
use crate::domain::ports::{BookingRepository, EmailService, PropertyRepository, UserRepository};
use crate::error::AppError;

pub const CONFIRMED_TEMPLATE: &str = "booking_confirmed.html";
pub const CANCELED_TEMPLATE: &str = "booking_canceled.html";

pub fn load_templates() -> Result<Tera, AppError> {
    let mut tera = Tera::default();
    tera.add_raw_template(CONFIRMED_TEMPLATE, include_str!("../../templates/booking_confirmed.html"))
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to load confirmation template: {:?}", e)))?;
    tera.add_raw_template(CANCELED_TEMPLATE, include_str!("../../templates/booking_canceled.html"))
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to load cancellation template: {:?}", e)))?;
    Ok(tera)
}

/// Minor units rendered with two decimals, e.g. 12550 -> "125.50".
pub fn format_amount(minor_units: i64) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

pub struct NotificationService {
    users: Arc<dyn UserRepository>,
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
    email: Arc<dyn EmailService>,
    templates: Arc<Tera>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        properties: Arc<dyn PropertyRepository>,
        bookings: Arc<dyn BookingRepository>,
        email: Arc<dyn EmailService>,
        templates: Arc<Tera>,
    ) -> Self {
        Self { users, properties, bookings, email, templates }
    }

    pub async fn send_booking_notice(&self, job_type: &str, booking_id: &str) -> Result<(), AppError> {
        let (template, subject_prefix) = match job_type {
            JOB_BOOKING_CONFIRMED => (CONFIRMED_TEMPLATE, "Booking confirmed"),
            JOB_BOOKING_CANCELED => (CANCELED_TEMPLATE, "Booking canceled"),
            other => return Err(AppError::InternalWithMsg(format!("No notification for job type {}", other))),
        };

        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound(format!("Booking {} not found", booking_id)))?;
        let property = self.properties.find_by_id(&booking.property_id).await?
            .ok_or(AppError::NotFound(format!("Property {} not found", booking.property_id)))?;
        let guest = self.users.find_by_id(&booking.user_id).await?
            .ok_or(AppError::NotFound(format!("User {} not found", booking.user_id)))?;

        let mut context = Context::new();
        context.insert("guest_name", &guest.name);
        context.insert("property_title", &property.title);
        context.insert("location", &property.location);
        context.insert("start_date", &booking.start_date.format("%Y-%m-%d").to_string());
        context.insert("end_date", &booking.end_date.format("%Y-%m-%d").to_string());
        context.insert("nights", &booking.nights());
        context.insert("total_price", &format_amount(booking.total_price));
        context.insert("booking_id", &booking.id);

        let html = self.templates.render(template, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Tera render error: {:?}", e)))?;
        let subject = format!("{}: {}", subject_prefix, property.title);

        self.email.send(&guest.email, &subject, &html).await?;
        info!("Sent {} notice for booking {} to {}", job_type, booking.id, guest.email);
        Ok(())
    }
}

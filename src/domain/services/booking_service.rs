use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use tracing::info;
use crate::domain::models::{
    auth::Principal,
    booking::{Booking, BookingStatus, NewBookingParams},
    job::{Job, JOB_BOOKING_CANCELED},
    property::Property,
    user::Role,
};
use crate::domain::ports::{BookingRepository, PropertyRepository};
use crate::domain::services::availability::{ensure_no_overlap, quote_total, validate_stay};
use crate::error::AppError;

pub struct BookingService {
    properties: Arc<dyn PropertyRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl BookingService {
    pub fn new(properties: Arc<dyn PropertyRepository>, bookings: Arc<dyn BookingRepository>) -> Self {
        Self { properties, bookings }
    }

    /// Books `[start_date, end_date)` as pending at `nights × price_per_night`.
    pub async fn create(
        &self,
        guest: &Principal,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Booking, AppError> {
        if !guest.has_any_role(&[Role::Guest, Role::Admin]) {
            return Err(AppError::Forbidden("Only guests can book properties".into()));
        }

        validate_stay(start_date, end_date)?;
        if start_date < today {
            return Err(AppError::Validation("start_date cannot be in the past".into()));
        }

        let property = self.properties.find_by_id(property_id).await?
            .ok_or(AppError::NotFound("Property not found".into()))?;

        if property.is_owned_by(&guest.id) {
            return Err(AppError::Forbidden("Hosts cannot book their own property".into()));
        }

        let total_price = quote_total(property.price_per_night, start_date, end_date)?;

        // Fast path; the repository repeats this check under a property lock.
        let existing = self.bookings.list_blocking(&property.id, start_date, end_date).await?;
        ensure_no_overlap(&existing, start_date, end_date)?;

        let booking = Booking::new(NewBookingParams {
            property_id: property.id.clone(),
            user_id: guest.id.clone(),
            start_date,
            end_date,
            total_price,
        });

        let created = self.bookings.create_exclusive(&booking).await?;
        info!("Booking {} created for property {} ({} to {}, total {})",
            created.id, property.id, created.start_date, created.end_date, created.total_price);
        Ok(created)
    }

    /// Loads a booking the caller may see: its guest, the property's host, or an admin.
    pub async fn get_visible(&self, caller: &Principal, booking_id: &str) -> Result<(Booking, Property), AppError> {
        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        let property = self.properties.find_by_id(&booking.property_id).await?
            .ok_or(AppError::NotFound("Property not found".into()))?;

        if caller.is_admin() || booking.user_id == caller.id || property.is_owned_by(&caller.id) {
            Ok((booking, property))
        } else {
            Err(AppError::NotFound("Booking not found".into()))
        }
    }

    pub async fn list_for_property(&self, caller: &Principal, property_id: &str) -> Result<Vec<Booking>, AppError> {
        let property = self.properties.find_by_id(property_id).await?
            .ok_or(AppError::NotFound("Property not found".into()))?;

        if !caller.is_admin() && !property.is_owned_by(&caller.id) {
            return Err(AppError::Forbidden("Only the host can list bookings for this property".into()));
        }

        self.bookings.list_by_property(&property.id).await
    }

    /// Cancels a pending or confirmed booking whose stay has not finished.
    /// Canceling an already canceled booking returns it unchanged.
    pub async fn cancel(&self, caller: &Principal, booking_id: &str, today: NaiveDate) -> Result<Booking, AppError> {
        let (booking, _) = self.get_visible(caller, booking_id).await?;

        if booking.status == BookingStatus::Canceled {
            return Ok(booking);
        }

        if booking.end_date <= today {
            return Err(AppError::Conflict("Stay has already ended".into()));
        }

        let notice = Job::new(JOB_BOOKING_CANCELED, booking.id.clone(), Utc::now());
        let canceled = self.bookings.cancel(&booking, vec![notice]).await?;

        info!("Booking {} canceled by {}", canceled.id, caller.id);
        Ok(canceled)
    }
}

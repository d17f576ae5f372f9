use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};
use crate::domain::models::{
    auth::Principal,
    booking::BookingStatus,
    job::{Job, JOB_BOOKING_CONFIRMED},
    payment::{ChargeOutcome, ChargeRequest, Payment, PaymentMethod, PaymentStatus},
};
use crate::domain::ports::{BookingRepository, PaymentGateway, PaymentRepository};
use crate::error::AppError;

pub struct PaymentService {
    bookings: Arc<dyn BookingRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self { bookings, payments, gateway }
    }

    /// Records a pending payment for the booking and queues it for the gateway.
    /// A failed payment is reset in place so the booking keeps a single payment row.
    pub async fn initiate(&self, caller: &Principal, booking_id: &str, method: PaymentMethod) -> Result<Payment, AppError> {
        let booking = self.bookings.find_by_id(booking_id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;

        if booking.user_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden("Only the guest can pay for this booking".into()));
        }

        match booking.status {
            BookingStatus::Canceled => return Err(AppError::Conflict("Booking is canceled".into())),
            BookingStatus::Confirmed => return Err(AppError::Conflict("Booking is already paid".into())),
            BookingStatus::Pending => {}
        }

        let mut payment = Payment::pending(booking.id.clone(), booking.total_price, method);

        if let Some(existing) = self.payments.find_by_booking(&booking.id).await? {
            match existing.status {
                PaymentStatus::Completed => return Err(AppError::Conflict("Booking is already paid".into())),
                PaymentStatus::Pending => return Err(AppError::Conflict("A payment is already in progress".into())),
                PaymentStatus::Failed => {
                    payment.id = existing.id;
                    payment.created_at = existing.created_at;
                }
            }
        }

        let job = Job::for_payment(booking.id.clone(), payment.id.clone());
        let stored = self.payments.upsert_pending(&payment, &job).await?;

        info!("Payment {} queued for booking {} ({:?}, amount {})",
            stored.id, booking.id, stored.payment_method, stored.amount);
        Ok(stored)
    }

    /// Charges a pending payment. Approval completes the payment and confirms the
    /// booking; a decline or gateway error fails the payment and leaves the booking pending.
    pub async fn process(&self, payment_id: &str) -> Result<Payment, AppError> {
        let payment = self.payments.find_by_id(payment_id).await?
            .ok_or(AppError::NotFound(format!("Payment {} not found", payment_id)))?;

        if payment.status != PaymentStatus::Pending {
            info!("Payment {} already settled as {:?}", payment.id, payment.status);
            return Ok(payment);
        }

        let booking = self.bookings.find_by_id(&payment.booking_id).await?
            .ok_or(AppError::NotFound(format!("Booking {} not found", payment.booking_id)))?;

        if booking.status != BookingStatus::Pending {
            warn!("Booking {} is {:?}; failing payment {}", booking.id, booking.status, payment.id);
            return self.payments.mark_failed(&payment.id).await;
        }

        if payment.amount != booking.total_price {
            warn!("Payment {} amount {} does not match booking total {}", payment.id, payment.amount, booking.total_price);
            return self.payments.mark_failed(&payment.id).await;
        }

        let outcome = match self.gateway.charge(&ChargeRequest::from(&payment)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.payments.mark_failed(&payment.id).await?;
                return Err(e);
            }
        };

        match outcome {
            ChargeOutcome::Approved { reference } => {
                let notice = Job::new(JOB_BOOKING_CONFIRMED, booking.id.clone(), Utc::now());
                match self.payments.complete(&payment, vec![notice]).await {
                    Ok(completed) => {
                        info!("Payment {} approved (ref {}); booking {} confirmed", completed.id, reference, booking.id);
                        Ok(completed)
                    }
                    Err(AppError::Conflict(msg)) => {
                        warn!("Payment {} approved but could not be applied: {}", payment.id, msg);
                        self.payments.mark_failed(&payment.id).await
                    }
                    Err(e) => Err(e),
                }
            }
            ChargeOutcome::Declined { reason } => {
                warn!("Payment {} declined: {}", payment.id, reason);
                self.payments.mark_failed(&payment.id).await
            }
        }
    }
}

use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, BookingRepository, EmailService, JobRepository, MessageRepository,
    PaymentGateway, PaymentRepository, PropertyRepository, ReviewRepository, UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService,
    booking_service::BookingService,
    notification::{load_templates, NotificationService},
    payment_service::PaymentService,
};
use crate::config::Config;
use crate::error::AppError;

/// One implementation of every storage port, all backed by the same pool.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub auth: Arc<dyn AuthRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub jobs: Arc<dyn JobRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub property_repo: Arc<dyn PropertyRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub message_repo: Arc<dyn MessageRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub auth_service: Arc<AuthService>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub notification_service: Arc<NotificationService>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        email_service: Arc<dyn EmailService>,
        payment_gateway: Arc<dyn PaymentGateway>,
    ) -> Result<Self, AppError> {
        let templates = Arc::new(load_templates()?);

        let auth_service = Arc::new(AuthService::new(repos.auth.clone(), config.clone())?);
        let booking_service = Arc::new(BookingService::new(repos.properties.clone(), repos.bookings.clone()));
        let payment_service = Arc::new(PaymentService::new(
            repos.bookings.clone(),
            repos.payments.clone(),
            payment_gateway,
        ));
        let notification_service = Arc::new(NotificationService::new(
            repos.users.clone(),
            repos.properties.clone(),
            repos.bookings.clone(),
            email_service,
            templates,
        ));

        Ok(Self {
            config,
            user_repo: repos.users,
            auth_repo: repos.auth,
            property_repo: repos.properties,
            booking_repo: repos.bookings,
            payment_repo: repos.payments,
            review_repo: repos.reviews,
            message_repo: repos.messages,
            job_repo: repos.jobs,
            auth_service,
            booking_service,
            payment_service,
            notification_service,
        })
    }
}

use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, booking, health, message, payment, property, review, user};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Users
        .route("/api/v1/users/me", get(user::get_me).put(user::update_me))
        .route("/api/v1/users/{user_id}", get(user::get_public_profile))

        // Admin
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/{user_id}/role", put(admin::update_user_role))

        // Properties
        .route("/api/v1/properties", get(property::search_properties).post(property::create_property))
        .route("/api/v1/properties/{property_id}", get(property::get_property).put(property::update_property).delete(property::delete_property))
        .route("/api/v1/properties/{property_id}/availability", get(property::get_availability))
        .route("/api/v1/host/properties", get(property::list_host_properties))

        // Bookings
        .route("/api/v1/properties/{property_id}/bookings", post(booking::create_booking).get(booking::list_property_bookings))
        .route("/api/v1/bookings", get(booking::list_my_bookings))
        .route("/api/v1/bookings/{booking_id}", get(booking::get_booking))
        .route("/api/v1/bookings/{booking_id}/cancel", post(booking::cancel_booking))

        // Payments
        .route("/api/v1/bookings/{booking_id}/payment", post(payment::create_payment).get(payment::get_payment))

        // Reviews
        .route("/api/v1/properties/{property_id}/reviews", get(review::list_reviews).post(review::create_review))
        .route("/api/v1/reviews/{review_id}", delete(review::delete_review))

        // Messages
        .route("/api/v1/messages", get(message::list_inbox).post(message::send_message))
        .route("/api/v1/messages/with/{user_id}", get(message::list_conversation))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

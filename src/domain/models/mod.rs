pub mod auth;
pub mod booking;
pub mod job;
pub mod message;
pub mod payment;
pub mod property;
pub mod review;
pub mod user;

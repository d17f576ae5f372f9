pub mod admin;
pub mod auth;
pub mod booking;
pub mod health;
pub mod message;
pub mod payment;
pub mod property;
pub mod review;
pub mod user;

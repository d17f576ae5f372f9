use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::error::AppError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Review {
    pub id: String,
    pub property_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(property_id: String, user_id: String, rating: i32, comment: String) -> Result<Self, AppError> {
        validate_rating(rating)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            property_id,
            user_id,
            rating,
            comment,
            created_at: Utc::now(),
        })
    }
}

pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "rating must be between {} and {}", MIN_RATING, MAX_RATING
        )));
    }
    Ok(())
}

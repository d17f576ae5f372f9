use crate::domain::{models::{property::ReviewSummary, review::Review}, ports::ReviewRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteReviewRepo {
    pool: SqlitePool,
}

impl SqliteReviewRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepo {
    async fn create(&self, review: &Review) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, property_id, user_id, rating, comment, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&review.id)
            .bind(&review.property_id)
            .bind(&review.user_id)
            .bind(review.rating)
            .bind(&review.comment)
            .bind(review.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_property(&self, property_id: &str) -> Result<Vec<Review>, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE property_id = ? ORDER BY created_at DESC")
            .bind(property_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn summary(&self, property_id: &str) -> Result<ReviewSummary, AppError> {
        sqlx::query_as::<_, ReviewSummary>(
            "SELECT COUNT(*) AS review_count, AVG(rating) AS average_rating FROM reviews WHERE property_id = ?"
        )
            .bind(property_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Review not found".into()));
        }
        Ok(())
    }
}

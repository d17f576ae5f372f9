use crate::domain::{models::job::{Job, STATUS_PENDING, STATUS_PROCESSING}, ports::JobRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::{Duration, Utc};

pub struct SqliteJobRepo {
    pool: SqlitePool,
}

impl SqliteJobRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl JobRepository for SqliteJobRepo {
    /// Claims due jobs by flipping them to PROCESSING in the same statement.
    /// A PROCESSING job whose claim outlived `lease` was abandoned and is claimed again.
    async fn find_pending(&self, limit: i32, lease: Duration) -> Result<Vec<Job>, AppError> {
        let now = Utc::now();

        sqlx::query_as::<_, Job>(
            r#"UPDATE jobs SET status = ?1, locked_at = ?2
               WHERE id IN (
                   SELECT id FROM jobs
                   WHERE (status = ?3 AND execute_at <= ?2)
                      OR (status = ?1 AND locked_at <= ?4)
                   ORDER BY execute_at ASC
                   LIMIT ?5
               )
               RETURNING *"#
        )
            .bind(STATUS_PROCESSING)
            .bind(now)
            .bind(STATUS_PENDING)
            .bind(now - lease)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_status(&self, id: &str, status: &str, error_message: Option<String>) -> Result<(), AppError> {
        sqlx::query("UPDATE jobs SET status = ?, error_message = ? WHERE id = ?")
            .bind(status)
            .bind(error_message)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_for_booking(&self, booking_id: &str) -> Result<Vec<Job>, AppError> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE json_extract(payload, '$.booking_id') = ? ORDER BY created_at ASC"
        )
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}

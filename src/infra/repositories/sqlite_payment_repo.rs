use crate::domain::{models::{job::Job, payment::Payment}, ports::PaymentRepository};
use crate::error::AppError;
use crate::infra::repositories::sqlite_booking_repo::insert_jobs;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqlitePaymentRepo {
    pool: SqlitePool,
}

impl SqlitePaymentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepo {
    async fn upsert_pending(&self, payment: &Payment, job: &Job) -> Result<Payment, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Only a failed payment may be reset; a concurrent pending or completed row wins.
        let stored = sqlx::query_as::<_, Payment>(
            r#"INSERT INTO payments (id, booking_id, amount, payment_method, status, payment_date, created_at)
               VALUES (?, ?, ?, ?, 'pending', NULL, ?)
               ON CONFLICT(booking_id) DO UPDATE SET
                   amount = excluded.amount,
                   payment_method = excluded.payment_method,
                   status = 'pending',
                   payment_date = NULL
               WHERE payments.status = 'failed'
               RETURNING *"#
        )
            .bind(&payment.id)
            .bind(&payment.booking_id)
            .bind(payment.amount)
            .bind(payment.payment_method)
            .bind(payment.created_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::Conflict("A payment already exists for this booking".into()))?;

        insert_jobs(&mut tx, std::slice::from_ref(job)).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(stored)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_booking(&self, booking_id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn mark_failed(&self, id: &str) -> Result<Payment, AppError> {
        let failed = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = 'failed', payment_date = ? WHERE id = ? AND status = 'pending' RETURNING *"
        )
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        // Already settled: report the row as it stands.
        match failed {
            Some(payment) => Ok(payment),
            None => self.find_by_id(id).await?
                .ok_or(AppError::NotFound("Payment not found".into())),
        }
    }

    async fn complete(&self, payment: &Payment, jobs: Vec<Job>) -> Result<Payment, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let confirmed = sqlx::query(
            "UPDATE bookings SET status = 'confirmed' WHERE id = ? AND status = 'pending'"
        )
            .bind(&payment.booking_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if confirmed.rows_affected() == 0 {
            return Err(AppError::Conflict("Booking is no longer pending".into()));
        }

        let completed = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = 'completed', payment_date = ? WHERE id = ? AND status = 'pending' RETURNING *"
        )
            .bind(Utc::now())
            .bind(&payment.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::Conflict("Payment is no longer pending".into()))?;

        insert_jobs(&mut tx, &jobs).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(completed)
    }
}

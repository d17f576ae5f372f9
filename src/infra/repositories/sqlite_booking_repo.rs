use crate::domain::{models::{booking::Booking, job::{Job, STATUS_CANCELLED, STATUS_PENDING}}, ports::BookingRepository};
use crate::domain::services::availability::ensure_no_overlap;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_jobs(tx: &mut Transaction<'_, Sqlite>, jobs: &[Job]) -> Result<(), AppError> {
    for job in jobs {
        sqlx::query(
            "INSERT INTO jobs (id, job_type, payload, execute_at, status, error_message, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
            .bind(&job.id)
            .bind(&job.job_type)
            .bind(&job.payload)
            .bind(job.execute_at)
            .bind(&job.status)
            .bind(&job.error_message)
            .bind(job.created_at)
            .execute(&mut **tx)
            .await
            .map_err(AppError::Database)?;
    }
    Ok(())
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_exclusive(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Writing first takes the database write lock, so concurrent requests queue here.
        let locked = sqlx::query("UPDATE properties SET updated_at = updated_at WHERE id = ?")
            .bind(&booking.property_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if locked.rows_affected() == 0 {
            return Err(AppError::NotFound("Property not found".into()));
        }

        let existing = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE property_id = ? AND status != 'canceled' AND start_date < ? AND end_date > ?"
        )
            .bind(&booking.property_id)
            .bind(booking.end_date)
            .bind(booking.start_date)
            .fetch_all(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        ensure_no_overlap(&existing, booking.start_date, booking.end_date)?;

        let created = sqlx::query_as::<_, Booking>(
            r#"INSERT INTO bookings (id, property_id, user_id, start_date, end_date, total_price, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               RETURNING *"#
        )
            .bind(&booking.id)
            .bind(&booking.property_id)
            .bind(&booking.user_id)
            .bind(booking.start_date)
            .bind(booking.end_date)
            .bind(booking.total_price)
            .bind(booking.status)
            .bind(booking.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_guest(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = ? ORDER BY start_date ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_property(&self, property_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE property_id = ? ORDER BY start_date ASC")
            .bind(property_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_blocking(&self, property_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            r#"SELECT * FROM bookings
               WHERE property_id = ? AND status != 'canceled' AND start_date < ? AND end_date > ?
               ORDER BY start_date ASC"#
        )
            .bind(property_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn cancel(&self, booking: &Booking, jobs: Vec<Job>) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let canceled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'canceled' WHERE id = ? AND status <> 'canceled' RETURNING *"
        )
            .bind(&booking.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        // Lost a race with another cancel; that one queued the jobs.
        let Some(canceled) = canceled else {
            let current = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
                .bind(&booking.id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::Database)?
                .ok_or(AppError::NotFound("Booking not found".into()))?;
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(current);
        };

        sqlx::query(
            "UPDATE jobs SET status = ? WHERE json_extract(payload, '$.booking_id') = ? AND status = ?"
        )
            .bind(STATUS_CANCELLED)
            .bind(&booking.id)
            .bind(STATUS_PENDING)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query(
            "UPDATE payments SET status = 'failed', payment_date = ? WHERE booking_id = ? AND status = 'pending'"
        )
            .bind(chrono::Utc::now())
            .bind(&booking.id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        insert_jobs(&mut tx, &jobs).await?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(canceled)
    }

    async fn has_confirmed_stay(&self, property_id: &str, user_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE property_id = ? AND user_id = ? AND status = 'confirmed'"
        )
            .bind(property_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(count > 0)
    }
}

use crate::domain::{models::property::{location_search_key, Property, PropertySearch}, ports::PropertyRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresPropertyRepo {
    pool: PgPool,
}

impl PostgresPropertyRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertyRepository for PostgresPropertyRepo {
    async fn create(&self, property: &Property) -> Result<Property, AppError> {
        sqlx::query_as::<_, Property>(
            r#"INSERT INTO properties (id, host_id, title, description, location, location_search, price_per_night, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#
        )
            .bind(&property.id)
            .bind(&property.host_id)
            .bind(&property.title)
            .bind(&property.description)
            .bind(&property.location)
            .bind(location_search_key(&property.location))
            .bind(property.price_per_night)
            .bind(property.created_at)
            .bind(property.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Property>, AppError> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn search(&self, search: &PropertySearch) -> Result<Vec<Property>, AppError> {
        let (check_in, check_out) = match search.stay_window() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        sqlx::query_as::<_, Property>(
            r#"
            SELECT p.* FROM properties p
            WHERE ($1::TEXT IS NULL OR p.location_search LIKE $1 ESCAPE '\')
              AND ($2::BIGINT IS NULL OR p.price_per_night >= $2)
              AND ($3::BIGINT IS NULL OR p.price_per_night <= $3)
              AND ($4::TEXT IS NULL OR p.host_id = $4)
              AND ($5::DATE IS NULL OR NOT EXISTS (
                    SELECT 1 FROM bookings b
                    WHERE b.property_id = p.id
                      AND b.status <> 'canceled'
                      AND daterange(b.start_date, b.end_date) && daterange($5::DATE, $6::DATE)
              ))
            ORDER BY p.created_at DESC
            LIMIT $7 OFFSET $8
            "#
        )
            .bind(search.location_pattern())
            .bind(search.min_price)
            .bind(search.max_price)
            .bind(&search.host_id)
            .bind(check_in)
            .bind(check_out)
            .bind(search.limit)
            .bind(search.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_host(&self, host_id: &str) -> Result<Vec<Property>, AppError> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE host_id = $1 ORDER BY created_at DESC")
            .bind(host_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, property: &Property) -> Result<Property, AppError> {
        sqlx::query_as::<_, Property>(
            r#"UPDATE properties SET
                title = $1, description = $2, location = $3, location_search = $4, price_per_night = $5, updated_at = $6
               WHERE id = $7
               RETURNING *"#
        )
            .bind(&property.title)
            .bind(&property.description)
            .bind(&property.location)
            .bind(location_search_key(&property.location))
            .bind(property.price_per_night)
            .bind(property.updated_at)
            .bind(&property.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Property not found".into()))
    }

    async fn delete(&self, id: &str, today: NaiveDate) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Holding the row lock keeps new bookings out while we check.
        let locked = sqlx::query("SELECT id FROM properties WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if locked.is_none() {
            return Err(AppError::NotFound("Property not found".into()));
        }

        let active: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE property_id = $1 AND status <> 'canceled' AND end_date > $2"
        )
            .bind(id)
            .bind(today)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if active > 0 {
            return Err(AppError::Conflict(format!("Property has {} active booking(s)", active)));
        }

        sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }
}

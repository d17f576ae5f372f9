use crate::domain::{models::user::{Role, User}, ports::UserRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresUserRepo {
    pool: PgPool,
}

impl PostgresUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepo {
    async fn create(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, role, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_profile(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET name = $1, password_hash = $2 WHERE id = $3 RETURNING *")
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(&user.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User not found".into()))
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<User, AppError> {
        sqlx::query_as::<_, User>("UPDATE users SET role = $1 WHERE id = $2 RETURNING *")
            .bind(role)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("User not found".into()))
    }
}

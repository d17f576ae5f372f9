use crate::domain::{models::message::Message, ports::MessageRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresMessageRepo { pool: PgPool }
impl PostgresMessageRepo { pub fn new(pool: PgPool) -> Self { Self { pool } } }

#[async_trait]
impl MessageRepository for PostgresMessageRepo {
    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, recipient_id, message_body, sent_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
            .bind(&message.id)
            .bind(&message.sender_id)
            .bind(&message.recipient_id)
            .bind(&message.message_body)
            .bind(message.sent_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_inbox(&self, user_id: &str) -> Result<Vec<Message>, AppError> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE recipient_id = $1 ORDER BY sent_at DESC"
        )
            .bind(user_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_conversation(&self, user_id: &str, other_id: &str) -> Result<Vec<Message>, AppError> {
        sqlx::query_as::<_, Message>(
            r#"SELECT * FROM messages
               WHERE (sender_id = $1 AND recipient_id = $2) OR (sender_id = $2 AND recipient_id = $1)
               ORDER BY sent_at ASC"#
        )
            .bind(user_id)
            .bind(other_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}

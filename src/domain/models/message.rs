use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub message_body: String,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: String, recipient_id: String, message_body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id,
            recipient_id,
            message_body,
            sent_at: Utc::now(),
        }
    }
}

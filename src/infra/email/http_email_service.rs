use crate::domain::ports::EmailService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::error;

/// Posts rendered mail to the relay configured by `MAIL_SERVICE_URL`.
pub struct HttpEmailService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct EmailPayload<'a> {
    from_alias: &'a str,
    to_addr: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

#[async_trait]
impl EmailService for HttpEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        let payload = EmailPayload {
            from_alias: "bookings",
            to_addr: recipient,
            subject,
            html_body,
        };

        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Email service connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Email service failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}

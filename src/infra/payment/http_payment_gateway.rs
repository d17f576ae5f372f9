use crate::domain::models::payment::{ChargeOutcome, ChargeRequest};
use crate::domain::ports::PaymentGateway;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, warn};

pub struct HttpPaymentGateway {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(api_url: String, api_key: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build gateway client: {}", e)))?;

        Ok(Self { client, api_url, api_key })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ChargeStatus {
    Approved,
    Declined,
}

#[derive(Deserialize)]
struct ChargeResponse {
    status: ChargeStatus,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome, AppError> {
        let res = self.client.post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Payment gateway connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();

        let outcome = charge_outcome(status, &text).inspect_err(|e| error!("{}", e))?;
        if let ChargeOutcome::Declined { reason } = &outcome {
            warn!("Gateway declined payment {}: {}", request.payment_id, reason);
        }
        Ok(outcome)
    }
}

/// Maps a gateway reply. `402` is a decline, any other non-2xx is a failure,
/// and a 2xx body carries the verdict.
fn charge_outcome(status: StatusCode, body: &str) -> Result<ChargeOutcome, AppError> {
    if status == StatusCode::PAYMENT_REQUIRED {
        return Ok(ChargeOutcome::Declined { reason: body.to_string() });
    }

    if !status.is_success() {
        return Err(AppError::InternalWithMsg(format!(
            "Payment gateway failed. Status: {}, Body: {}", status, body
        )));
    }

    let reply: ChargeResponse = serde_json::from_str(body)
        .map_err(|e| AppError::InternalWithMsg(format!("Invalid payment gateway response: {}", e)))?;

    Ok(match reply.status {
        ChargeStatus::Approved => ChargeOutcome::Approved {
            reference: reply.reference.unwrap_or_default(),
        },
        ChargeStatus::Declined => ChargeOutcome::Declined {
            reason: reply.reason.unwrap_or_else(|| "declined".to_string()),
        },
    })
}

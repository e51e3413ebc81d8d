/// Client for the backend verification endpoint
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::errors::{AppError, VerificationError};
use crate::models::{VerificationRequest, VerificationResponse};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Submit a signed proof. `Ok` only for a 2xx answer with `success: true`.
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse, VerificationError>;
}

#[derive(Clone)]
pub struct HttpVerificationService {
    client: Client,
    endpoint: String,
}

impl HttpVerificationService {
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.verify_url(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl VerificationService for HttpVerificationService {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationResponse, VerificationError> {
        info!(
            endpoint = %self.endpoint,
            user_id = request.user_id,
            address = %request.public_key,
            "Sending verification request"
        );

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        interpret_response(status, &body)
    }
}

/// Map an endpoint answer onto the error taxonomy. Empty `message`
/// fields count as absent.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<VerificationResponse, VerificationError> {
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Server error: {}", status.as_u16()));
        warn!(status = status.as_u16(), message = %message, "Verification endpoint returned an error status");
        return Err(VerificationError::ServerRejected {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: VerificationResponse = serde_json::from_str(body)
        .map_err(|e| VerificationError::MalformedResponse(e.to_string()))?;

    if parsed.success {
        Ok(parsed)
    } else {
        let message = parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Verification failed".to_string());
        Err(VerificationError::ServerRejected {
            status: status.as_u16(),
            message,
        })
    }
}

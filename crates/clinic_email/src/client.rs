//! HTTP client for the email function.

use clinic_common::create_client;
use clinic_common::services::{
    BoxFuture, EmailNotification, NotificationResult, NotificationService,
};
use clinic_config::EmailConfig;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Header carrying the per-delivery request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Errors that can occur when calling the email function
#[derive(Error, Debug)]
pub enum EmailError {
    /// Error during HTTP request to the email function
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// Missing or invalid configuration
    #[error("Missing configuration: {0}")]
    ConfigError(String),

    /// The email function answered with a non-success status
    #[error("Email function error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct EmailFunctionResponse {
    status: Option<String>,
}

/// Sends notifications as JSON POSTs to the configured email function.
#[derive(Debug, Clone)]
pub struct HttpEmailService {
    client: Client,
    service_url: String,
}

impl HttpEmailService {
    /// Build the service from its configuration section.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        if config.service_url.trim().is_empty() {
            return Err(EmailError::ConfigError(
                "email.service_url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: create_client(config.timeout_secs, false)?,
            service_url: config.service_url.clone(),
        })
    }

    /// Deliver a single notification.
    pub async fn deliver(
        &self,
        notification: &EmailNotification,
    ) -> Result<NotificationResult, EmailError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(
            "Sending {} email to {} ({})",
            notification.action(),
            notification.recipient(),
            request_id
        );

        let response = self
            .client
            .post(&self.service_url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EmailError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let reported = serde_json::from_str::<EmailFunctionResponse>(&body)
            .ok()
            .and_then(|r| r.status)
            .unwrap_or_else(|| "sent".to_string());

        info!(
            "{} email for {} accepted ({})",
            notification.action(),
            notification.recipient(),
            request_id
        );

        Ok(NotificationResult {
            id: request_id,
            status: reported,
        })
    }
}

impl NotificationService for HttpEmailService {
    type Error = EmailError;

    fn send_email(
        &self,
        notification: EmailNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        Box::pin(async move { self.deliver(&notification).await })
    }
}

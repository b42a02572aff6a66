//! Channel senders used by the running service.
//!
//! Supports two providers:
//! - `console`: logs the message and reports success (development)
//! - `http`: POSTs a signed JSON envelope to a per-channel provider endpoint

use async_trait::async_trait;
use domain::models::Channel;
use domain::services::{ChannelSender, OutboundMessage, SendOutcome, SenderError};
use reqwest::{header, Client};
use shared::crypto::sign_payload;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{DeliveryConfig, SenderProvider};

/// Header carrying the HMAC-SHA256 signature of the request body.
pub const SIGNATURE_HEADER: &str = "X-Notify-Signature";

/// Header carrying the delivery log id, usable as an idempotency key.
pub const LOG_ID_HEADER: &str = "X-Notify-Log-Id";

/// Sender that logs every message and reports it delivered.
#[derive(Debug, Clone, Default)]
pub struct ConsoleChannelSender;

#[async_trait]
impl ChannelSender for ConsoleChannelSender {
    async fn send(&self, message: &OutboundMessage) -> Result<SendOutcome, SenderError> {
        info!(
            log_id = %message.log_id,
            user_id = %message.user_id,
            to = %message.email,
            channel = %message.channel,
            notification_type = %message.notification_type,
            "Console sender: notification delivered"
        );
        Ok(SendOutcome::Delivered)
    }
}

/// Sender that hands messages to an HTTP provider.
///
/// 2xx responses count as delivered; any other status is a structured
/// failure `provider_status_<code>`. Transport errors are faults.
#[derive(Debug, Clone)]
pub struct HttpChannelSender {
    client: Client,
    email_endpoint: String,
    sms_endpoint: String,
    push_endpoint: String,
    signing_secret: Option<String>,
}

impl HttpChannelSender {
    /// Create a sender from delivery configuration.
    pub fn new(config: &DeliveryConfig) -> Result<Self, SenderError> {
        let client = Client::builder()
            .timeout(config.send_timeout() + Duration::from_secs(1))
            .build()
            .map_err(|e| SenderError::Misconfigured(e.to_string()))?;

        Ok(Self {
            client,
            email_endpoint: config.email_endpoint.clone(),
            sms_endpoint: config.sms_endpoint.clone(),
            push_endpoint: config.push_endpoint.clone(),
            signing_secret: config.signing_secret().map(str::to_string),
        })
    }

    fn endpoint(&self, channel: Channel) -> &str {
        match channel {
            Channel::Email => &self.email_endpoint,
            Channel::Sms => &self.sms_endpoint,
            Channel::Push => &self.push_endpoint,
        }
    }
}

#[async_trait]
impl ChannelSender for HttpChannelSender {
    async fn send(&self, message: &OutboundMessage) -> Result<SendOutcome, SenderError> {
        let url = self.endpoint(message.channel);
        let payload = serde_json::to_string(message)
            .map_err(|e| SenderError::Misconfigured(e.to_string()))?;

        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(LOG_ID_HEADER, message.log_id.to_string());

        if let Some(secret) = &self.signing_secret {
            let signature = sign_payload(&payload, secret)
                .map_err(|e| SenderError::Misconfigured(e.to_string()))?;
            request = request.header(SIGNATURE_HEADER, signature);
        }

        debug!(log_id = %message.log_id, url = %url, "Posting notification to provider");

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| SenderError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(SendOutcome::Delivered)
        } else {
            warn!(
                log_id = %message.log_id,
                status = status.as_u16(),
                "Provider rejected notification"
            );
            Ok(SendOutcome::Failed(format!(
                "provider_status_{}",
                status.as_u16()
            )))
        }
    }
}

/// Build the sender selected by `delivery.provider`.
pub fn build_sender(config: &DeliveryConfig) -> Result<Arc<dyn ChannelSender>, SenderError> {
    match config.provider {
        SenderProvider::Console => Ok(Arc::new(ConsoleChannelSender)),
        SenderProvider::Http => Ok(Arc::new(HttpChannelSender::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Bytes, http::HeaderMap, http::StatusCode, routing::post, Router};
    use domain::models::{Metadata, NotificationType};
    use shared::crypto::verify_signature;
    use tokio::net::TcpListener;
    use uuid::Uuid;

    const SECRET: &str = "provider-secret";

    fn message(channel: Channel) -> OutboundMessage {
        let mut content = Metadata::new();
        content.insert("subject".to_string(), serde_json::json!("Hello"));
        OutboundMessage {
            log_id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            notification_type: NotificationType::Updates,
            channel,
            content,
        }
    }

    fn delivery_config(base: &str, secret: &str) -> DeliveryConfig {
        DeliveryConfig {
            provider: SenderProvider::Http,
            email_endpoint: format!("{}/email", base),
            sms_endpoint: format!("{}/sms", base),
            push_endpoint: format!("{}/push", base),
            signing_secret: secret.to_string(),
            send_timeout_ms: 2_000,
            stale_pending_secs: 300,
            sweep_interval_secs: 60,
        }
    }

    /// Fake provider: email accepts signed requests, sms always answers 503.
    async fn spawn_provider() -> String {
        async fn email(headers: HeaderMap, body: Bytes) -> StatusCode {
            let payload = String::from_utf8_lossy(&body);
            let signed = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|sig| verify_signature(&payload, SECRET, sig))
                .unwrap_or(false);
            if signed && headers.contains_key(LOG_ID_HEADER) {
                StatusCode::ACCEPTED
            } else {
                StatusCode::UNAUTHORIZED
            }
        }

        let app = Router::new()
            .route("/email", post(email))
            .route("/sms", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_console_sender_always_delivers() {
        let outcome = ConsoleChannelSender.send(&message(Channel::Push)).await.unwrap();
        assert_eq!(outcome, SendOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_http_sender_signed_delivery() {
        let base = spawn_provider().await;
        let sender = HttpChannelSender::new(&delivery_config(&base, SECRET)).unwrap();

        let outcome = sender.send(&message(Channel::Email)).await.unwrap();
        assert_eq!(outcome, SendOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_http_sender_wrong_secret_is_rejected() {
        let base = spawn_provider().await;
        let sender = HttpChannelSender::new(&delivery_config(&base, "other")).unwrap();

        let outcome = sender.send(&message(Channel::Email)).await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed("provider_status_401".to_string()));
    }

    #[tokio::test]
    async fn test_http_sender_non_success_status_is_failure() {
        let base = spawn_provider().await;
        let sender = HttpChannelSender::new(&delivery_config(&base, SECRET)).unwrap();

        let outcome = sender.send(&message(Channel::Sms)).await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed("provider_status_503".to_string()));
    }

    #[tokio::test]
    async fn test_http_sender_unreachable_provider_is_fault() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sender =
            HttpChannelSender::new(&delivery_config(&format!("http://{}", addr), SECRET)).unwrap();
        let result = sender.send(&message(Channel::Email)).await;
        assert!(matches!(result, Err(SenderError::Transport(_))));
    }

    #[test]
    fn test_build_sender_console() {
        let mut config = delivery_config("http://unused", "");
        config.provider = SenderProvider::Console;
        assert!(build_sender(&config).is_ok());
    }
}

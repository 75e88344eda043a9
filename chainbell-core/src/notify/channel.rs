//! Outbound delivery channels.

use super::render::Message;
use async_trait::async_trait;
use chainbell_sdk::signature::{SIGNATURE_HEADER, format_signature_header, sign_body};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a delivery try failed.
///
/// Only [`Transient`](DeliveryError::Transient) and
/// [`RateLimited`](DeliveryError::RateLimited) are worth another try.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("transient delivery failure: {0}")]
    Transient(String),

    #[error("rate limited by target")]
    RateLimited { retry_after: Option<Duration> },

    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("target blocks delivery")]
    Blocked,

    #[error("target no longer exists")]
    TargetGone,

    #[error("missing access to target")]
    MissingAccess,

    #[error("target rejected delivery with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl DeliveryError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryError::Transient(_) | DeliveryError::RateLimited { .. }
        )
    }

    /// Minimum wait the target asked for before the next try.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DeliveryError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Sends a rendered message to one subscription target.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send_to_target(&self, target: &str, message: &Message) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: DeliveryChannel + ?Sized> DeliveryChannel for std::sync::Arc<T> {
    async fn send_to_target(&self, target: &str, message: &Message) -> Result<(), DeliveryError> {
        (**self).send_to_target(target, message).await
    }
}

/// Map a non-success HTTP response to a delivery error.
pub fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: String,
) -> Result<(), DeliveryError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::UNAUTHORIZED => DeliveryError::MissingAccess,
        StatusCode::FORBIDDEN => DeliveryError::Blocked,
        StatusCode::NOT_FOUND | StatusCode::GONE => DeliveryError::TargetGone,
        StatusCode::TOO_MANY_REQUESTS => DeliveryError::RateLimited { retry_after },
        StatusCode::REQUEST_TIMEOUT => {
            DeliveryError::Transient(format!("status {}", status.as_u16()))
        }
        s if s.is_server_error() => DeliveryError::Transient(format!("status {}: {body}", s.as_u16())),
        s => DeliveryError::Rejected {
            status: s.as_u16(),
            body,
        },
    })
}

/// Webhook delivery: POSTs the message body as signed JSON to the target URL.
pub struct WebhookChannel {
    http_client: reqwest::Client,
    signing_secret: Vec<u8>,
}

impl WebhookChannel {
    pub fn new(signing_secret: impl Into<Vec<u8>>, request_timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(request_timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            signing_secret: signing_secret.into(),
        }
    }

    fn parse_target(target: &str) -> Result<url::Url, DeliveryError> {
        let url = url::Url::parse(target)
            .map_err(|e| DeliveryError::Unreachable(format!("invalid target url: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DeliveryError::Unreachable(format!(
                "unsupported target scheme: {other}"
            ))),
        }
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    async fn send_to_target(&self, target: &str, message: &Message) -> Result<(), DeliveryError> {
        let url = Self::parse_target(target)?;
        let body = serde_json::to_string(&message.body)
            .map_err(|e| DeliveryError::Rejected {
                status: 0,
                body: format!("unserializable message: {e}"),
            })?;
        let timestamp = time::OffsetDateTime::now_utc().unix_timestamp();
        let signature = sign_body(&body, timestamp, &self.signing_secret);

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, format_signature_header(timestamp, &signature))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    DeliveryError::Unreachable(e.to_string())
                } else {
                    DeliveryError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        debug!(url = target, status = status.as_u16(), "Webhook responded");
        if status.is_success() {
            return Ok(());
        }
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = response.text().await.unwrap_or_default();
        classify_status(status, retry_after, body)
    }
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK, None, String::new()), Ok(()));
        assert_eq!(classify_status(StatusCode::NO_CONTENT, None, String::new()), Ok(()));
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, None, String::new()),
            Err(DeliveryError::MissingAccess)
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, None, String::new()),
            Err(DeliveryError::Blocked)
        );
        assert_eq!(
            classify_status(StatusCode::GONE, None, String::new()),
            Err(DeliveryError::TargetGone)
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, None, "nope".to_string()),
            Err(DeliveryError::Rejected {
                status: 400,
                body: "nope".to_string()
            })
        );
    }

    #[test]
    fn test_retryable_classes() {
        let server = classify_status(StatusCode::BAD_GATEWAY, None, String::new());
        assert!(server.is_err_and(|e| e.is_retryable()));

        let limited = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(7)),
            String::new(),
        );
        assert_eq!(
            limited.unwrap_err().retry_after(),
            Some(Duration::from_secs(7))
        );

        assert!(!DeliveryError::TargetGone.is_retryable());
        assert!(!DeliveryError::Unreachable("x".into()).is_retryable());
        assert!(!DeliveryError::Blocked.is_retryable());
        assert!(!DeliveryError::MissingAccess.is_retryable());
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn test_invalid_target_is_unreachable() {
        let channel = WebhookChannel::new("secret", Duration::from_secs(1));
        let message = Message::new(serde_json::json!({"a": 1}));

        let err = channel
            .send_to_target("not a url", &message)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Unreachable(_)));

        let err = channel
            .send_to_target("ftp://example.com/hook", &message)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Unreachable(_)));
    }
}

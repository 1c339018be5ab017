//! Outbound LINE Messaging API client and webhook signature verification.
//!
//! Delivery is fire-and-forget from the coordinator's perspective: callers
//! log push failures and never fail the underlying mutation on them.

pub mod messages;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

const PUSH_ENDPOINT: &str = "https://api.line.me/v2/bot/message/push";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("LINE API error: {status} {body}")]
    Api { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A message the LINE push endpoint accepts. The `type` tag and field
/// casing follow the Messaging API wire format.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LineMessage {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: serde_json::Value,
    },
}

impl LineMessage {
    pub fn text(text: impl Into<String>) -> Self {
        LineMessage::Text { text: text.into() }
    }
}

#[derive(Serialize)]
struct PushBody<'a> {
    to: &'a str,
    messages: &'a [LineMessage],
}

/// Thin client over the Messaging API push endpoint.
#[derive(Clone)]
pub struct LineClient {
    http: reqwest::Client,
    channel_access_token: String,
}

impl LineClient {
    pub fn new(channel_access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            channel_access_token: channel_access_token.into(),
        }
    }

    /// Push messages to a single recipient.
    pub async fn push(&self, to: &str, messages: &[LineMessage]) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(PUSH_ENDPOINT)
            .bearer_auth(&self.channel_access_token)
            .json(&PushBody { to, messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to, count = messages.len(), "pushed LINE messages");
        Ok(())
    }
}

/// Verify an `x-line-signature` header value against the raw webhook body:
/// base64(HMAC-SHA256(channel secret, body)). Comparison is constant-time
/// via the MAC verifier.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = BASE64.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        BASE64.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn text_message_serializes_to_line_wire_format() {
        let json = serde_json::to_value(LineMessage::text("您的預約已確認")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"], "您的預約已確認");
    }

    #[test]
    fn flex_message_carries_alt_text() {
        let message = LineMessage::Flex {
            alt_text: "預約確認通知".to_string(),
            contents: serde_json::json!({"type": "bubble"}),
        };
        let json = serde_json::to_value(message).unwrap();
        assert_eq!(json["type"], "flex");
        assert_eq!(json["altText"], "預約確認通知");
        assert_eq!(json["contents"]["type"], "bubble");
    }

    #[test]
    fn valid_signature_verifies() {
        let secret = "channel-secret";
        let body = br#"{"events":[]}"#;
        let signature = sign(secret, body);
        assert!(verify_signature(secret, body, &signature));
    }

    #[test]
    fn tampered_body_or_bad_encoding_fails() {
        let secret = "channel-secret";
        let signature = sign(secret, b"original");
        assert!(!verify_signature(secret, b"tampered", &signature));
        assert!(!verify_signature(secret, b"original", "not base64!!"));
        assert!(!verify_signature("other-secret", b"original", &signature));
    }
}

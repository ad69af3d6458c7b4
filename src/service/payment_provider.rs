use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::{config::Config, service::error::ServiceError};

const STRIPE_API_BASE: &str = "https://api.stripe.com";
/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub product_name: String,
    pub amount: f64,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayEvent {
    pub event_type: String,
    pub session_id: String,
    pub metadata: BTreeMap<String, String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ServiceError>;

    /// Authenticates a raw webhook body and extracts the event.
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, ServiceError>;
}

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    webhook_secret: String,
    client_url: String,
}

impl StripeGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: config.stripe_secret_key.clone(),
            webhook_secret: config.stripe_webhook_secret.clone(),
            client_url: config.client_url.trim_end_matches('/').to_string(),
        }
    }

    fn checkout_form(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        let unit_amount = (request.amount * 100.0).round() as i64;
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[]".to_string(), "card".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                "usd".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                unit_amount.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "success_url".to_string(),
                format!(
                    "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.client_url
                ),
            ),
            (
                "cancel_url".to_string(),
                format!("{}/payment-cancel", self.client_url),
            ),
        ];
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }
        form
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: String,
}

#[derive(Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Deserialize)]
struct StripeEventObject {
    id: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let body = serde_urlencoded::to_string(self.checkout_form(&request))
            .map_err(|e| ServiceError::Gateway(e.to_string()))?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", STRIPE_API_BASE))
            .bearer_auth(&self.secret_key)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| ServiceError::Gateway(format!("Network error: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::Gateway(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            tracing::error!("Stripe checkout failed ({}): {}", status.as_u16(), message);
            return Err(ServiceError::Gateway(message));
        }

        let session: CheckoutSession = serde_json::from_str(&text)
            .map_err(|e| ServiceError::Gateway(format!("Unexpected checkout response: {}", e)))?;

        tracing::info!(
            "Created checkout session {} for {}",
            session.id,
            request.product_name
        );
        Ok(session)
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<GatewayEvent, ServiceError> {
        verify_signature(
            payload,
            signature,
            &self.webhook_secret,
            Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }
}

fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> Result<Vec<u8>, ServiceError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| ServiceError::Gateway(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Checks a `t=<unix>,v1=<hex>` signature header against the payload.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), ServiceError> {
    let invalid = || ServiceError::validation("Invalid webhook signature");

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(invalid)?;
    let signed_at: i64 = timestamp.parse().map_err(|_| invalid())?;
    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(ServiceError::validation("Webhook signature has expired"));
    }

    let expected = sign(secret, timestamp, payload)?;
    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| bool::from(bytes.ct_eq(&expected)))
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(invalid())
    }
}

pub fn parse_event(payload: &[u8]) -> Result<GatewayEvent, ServiceError> {
    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|e| ServiceError::validation(format!("Malformed webhook payload: {}", e)))?;

    Ok(GatewayEvent {
        event_type: event.event_type,
        session_id: event.data.object.id,
        metadata: event.data.object.metadata,
    })
}

/// Builds a signature header the way the gateway does.
#[cfg(test)]
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = sign(secret, &timestamp.to_string(), payload).unwrap();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

#[cfg(test)]
pub mod fake {
    use std::sync::Mutex;

    use super::*;

    /// Records checkout requests and accepts any webhook whose signature is
    /// `"valid"`.
    #[derive(Default)]
    pub struct FakeGateway {
        pub requests: Mutex<Vec<CheckoutRequest>>,
        pub fail: bool,
    }

    impl FakeGateway {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn last_request(&self) -> Option<CheckoutRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout_session(
            &self,
            request: CheckoutRequest,
        ) -> Result<CheckoutSession, ServiceError> {
            if self.fail {
                return Err(ServiceError::Gateway("gateway unavailable".to_string()));
            }
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            let id = format!("cs_test_{}", requests.len());
            Ok(CheckoutSession {
                url: format!("https://checkout.test/{}", id),
                id,
            })
        }

        fn verify_webhook(
            &self,
            payload: &[u8],
            signature: &str,
        ) -> Result<GatewayEvent, ServiceError> {
            if signature != "valid" {
                return Err(ServiceError::validation("Invalid webhook signature"));
            }
            parse_event(payload)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_1","metadata":{"projectId":"p","action":"claim-money"}}}}"#;

    #[test]
    fn accepts_a_fresh_valid_signature() {
        let header = signature_header(PAYLOAD, SECRET, 1_700_000_000);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 1_700_000_100).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = signature_header(PAYLOAD, SECRET, 1_700_000_000);
        let tampered = br#"{"type":"checkout.session.completed","data":{"object":{"id":"cs_2"}}}"#;
        assert!(verify_signature(tampered, &header, SECRET, 1_700_000_000).is_err());
    }

    #[test]
    fn rejects_wrong_secret_and_stale_timestamp() {
        let header = signature_header(PAYLOAD, "whsec_other", 1_700_000_000);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 1_700_000_000).is_err());

        let header = signature_header(PAYLOAD, SECRET, 1_700_000_000);
        let err = verify_signature(PAYLOAD, &header, SECRET, 1_700_000_301).unwrap_err();
        assert_eq!(err.to_string(), "Webhook signature has expired");
    }

    #[test]
    fn rejects_malformed_headers() {
        assert!(verify_signature(PAYLOAD, "", SECRET, 0).is_err());
        assert!(verify_signature(PAYLOAD, "t=abc,v1=00", SECRET, 0).is_err());
        assert!(verify_signature(PAYLOAD, "t=0,v1=not-hex", SECRET, 0).is_err());
    }

    #[test]
    fn any_matching_v1_candidate_is_enough() {
        let valid = signature_header(PAYLOAD, SECRET, 42);
        let v1 = valid.split(",v1=").nth(1).unwrap();
        let header = format!("t=42,v1=deadbeef,v1={}", v1);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 42).is_ok());
    }

    #[test]
    fn parses_checkout_event() {
        let event = parse_event(PAYLOAD).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.session_id, "cs_1");
        assert_eq!(event.metadata.get("action").map(String::as_str), Some("claim-money"));
    }

    #[test]
    fn checkout_form_uses_cents_and_metadata() {
        let gateway = StripeGateway {
            client: reqwest::Client::new(),
            secret_key: "sk_test".to_string(),
            webhook_secret: SECRET.to_string(),
            client_url: "http://localhost:5173".to_string(),
        };
        let mut metadata = BTreeMap::new();
        metadata.insert("projectId".to_string(), "abc".to_string());
        let form = gateway.checkout_form(&CheckoutRequest {
            product_name: "Escrow".to_string(),
            amount: 19.99,
            metadata,
        });
        assert!(form.contains(&(
            "line_items[0][price_data][unit_amount]".to_string(),
            "1999".to_string()
        )));
        assert!(form.contains(&("metadata[projectId]".to_string(), "abc".to_string())));
        assert!(form.iter().any(|(k, v)| k == "cancel_url" && v == "http://localhost:5173/payment-cancel"));
    }
}

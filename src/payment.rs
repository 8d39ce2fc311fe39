//! Client for the payment backend the submission form posts to.
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::config::{Config, DEFAULT_PAYMENT_ENDPOINT};
use crate::error::{Error, Result};
use crate::model::EquipmentPaymentPayload;

const MISSING_PAYMENT_CONFIG: &str = "Missing PAYMENT API configuration.";

static LEADING_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/+").expect("valid regex"));
static TRAILING_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+$").expect("valid regex"));

/// Join a base URL and an endpoint with exactly one slash between them,
/// whatever slashes either side already carries.
pub fn join_url(base: &str, endpoint: &str) -> String {
    let base = TRAILING_SLASHES.replace(base, "");
    let endpoint = LEADING_SLASHES.replace(endpoint, "");
    format!("{base}/{endpoint}")
}

/// What the form controller needs from the payment backend, so tests can
/// substitute a recording fake.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_payment(&self, payload: &EquipmentPaymentPayload) -> Result<Value>;

    /// Clear any posting/error/response state left by earlier calls.
    fn reset(&self);
}

/// Observable request state: in-flight flag, last rejection message, last
/// success body.
#[derive(Debug, Default)]
struct PostState {
    posting: bool,
    error: Option<String>,
    data: Option<Value>,
}

/// Posts payment requests and exposes the outcome of the latest attempt.
///
/// Clones share one state slot; overlapping calls from clones overwrite
/// each other's error and data, last writer wins.
#[derive(Clone)]
pub struct PaymentClient {
    http: Client,
    base_url: String,
    token: String,
    endpoint: String,
    state: Arc<Mutex<PostState>>,
}

impl fmt::Debug for PaymentClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentClient")
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PaymentClient {
    pub fn new(base_url: String, token: String, endpoint: String) -> Self {
        let http = Client::builder()
            .user_agent("equipment-portal/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_PAYMENT_ENDPOINT.to_string()
        } else {
            endpoint
        };
        Self {
            http,
            base_url,
            token,
            endpoint,
            state: Arc::new(Mutex::new(PostState::default())),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.payment.base_url.clone(),
            cfg.payment.token.clone(),
            cfg.payment.endpoint.clone(),
        )
    }

    fn state(&self) -> MutexGuard<'_, PostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// True while a request is in flight.
    pub fn is_posting(&self) -> bool {
        self.state().posting
    }

    /// Message of the most recent configuration or upstream failure.
    /// Transport failures do not land here.
    pub fn last_error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Parsed body of the most recent successful request.
    pub fn last_response(&self) -> Option<Value> {
        self.state().data.clone()
    }

    /// Clear the posting flag, error, and last response. Idempotent.
    pub fn reset(&self) {
        *self.state() = PostState::default();
    }

    /// POST the payload to `{base_url}/{endpoint}`. One attempt, no retry.
    pub async fn create_payment(&self, payload: &EquipmentPaymentPayload) -> Result<Value> {
        if self.base_url.trim().is_empty() || self.token.trim().is_empty() {
            // Fails before the request path, so the posting flag never flips
            // for a configuration error.
            self.state().error = Some(MISSING_PAYMENT_CONFIG.to_string());
            return Err(Error::config(MISSING_PAYMENT_CONFIG));
        }
        let url = join_url(&self.base_url, &self.endpoint);
        {
            let mut state = self.state();
            state.posting = true;
            state.error = None;
            state.data = None;
        }
        let outcome = self.post_payload(&url, payload).await;
        let mut state = self.state();
        state.posting = false;
        match outcome {
            Ok(json) => {
                state.data = Some(json.clone());
                Ok(json)
            }
            Err(err) => {
                if matches!(err, Error::Upstream { .. }) {
                    state.error = Some(err.to_string());
                }
                Err(err)
            }
        }
    }

    async fn post_payload(&self, url: &str, payload: &EquipmentPaymentPayload) -> Result<Value> {
        debug!(%url, "posting payment request");
        let res = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.token))
            .json(payload)
            .send()
            .await
            .map_err(|err| Error::network(err.to_string()))?;
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(Error::upstream(status, failure_message(status, &text)));
        }
        if text.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&text)
            .map_err(|err| Error::upstream(status, format!("invalid payment response: {err}")))
    }
}

#[async_trait]
impl PaymentService for PaymentClient {
    async fn create_payment(&self, payload: &EquipmentPaymentPayload) -> Result<Value> {
        PaymentClient::create_payment(self, payload).await
    }

    fn reset(&self) {
        PaymentClient::reset(self);
    }
}

/// Human-readable message for a rejected payment request: a JSON body's
/// non-empty `message` or `error` string, else a generic line carrying the
/// raw body when it was not JSON.
fn failure_message(status: u16, body: &str) -> String {
    let fallback = format!("Failed to create payment request ({status})");
    if body.is_empty() {
        return fallback;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|key| {
                json.get(*key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string)
            .unwrap_or(fallback),
        Err(_) => format!("{fallback}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> PaymentClient {
        PaymentClient::new(String::new(), String::new(), String::new())
    }

    #[test]
    fn join_url_strips_redundant_slashes() {
        assert_eq!(
            join_url("https://api.example.com/", "request-payment"),
            "https://api.example.com/request-payment"
        );
        assert_eq!(
            join_url("https://api.example.com", "request-payment"),
            "https://api.example.com/request-payment"
        );
        assert_eq!(
            join_url("https://api.example.com//", "//request-payment"),
            "https://api.example.com/request-payment"
        );
        assert_eq!(
            join_url("https://api.example.com/api/v1/", "/request-payment"),
            "https://api.example.com/api/v1/request-payment"
        );
    }

    #[test]
    fn failure_message_prefers_json_message() {
        assert_eq!(failure_message(422, r#"{"message":"no budget"}"#), "no budget");
        assert_eq!(failure_message(422, r#"{"error":"denied"}"#), "denied");
    }

    #[test]
    fn failure_message_skips_empty_strings() {
        assert_eq!(
            failure_message(422, r#"{"message":"","error":"denied"}"#),
            "denied"
        );
        assert_eq!(
            failure_message(422, r#"{"message":"","error":""}"#),
            "Failed to create payment request (422)"
        );
    }

    #[test]
    fn failure_message_ignores_non_string_fields() {
        assert_eq!(
            failure_message(500, r#"{"message":123}"#),
            "Failed to create payment request (500)"
        );
    }

    #[test]
    fn failure_message_appends_non_json_body() {
        assert_eq!(
            failure_message(503, "Service Unavailable"),
            "Failed to create payment request (503): Service Unavailable"
        );
    }

    #[test]
    fn failure_message_empty_body_is_generic() {
        assert_eq!(failure_message(500, ""), "Failed to create payment request (500)");
    }

    #[test]
    fn blank_endpoint_falls_back_to_default() {
        let client = unconfigured();
        assert_eq!(client.endpoint, DEFAULT_PAYMENT_ENDPOINT);
        let client = PaymentClient::new(String::new(), String::new(), "submit".to_string());
        assert_eq!(client.endpoint, "submit");
    }

    #[tokio::test]
    async fn missing_config_sets_error_without_posting() {
        let client = unconfigured();
        let err = client
            .create_payment(&EquipmentPaymentPayload {
                fullname: "Ada".into(),
                branch: String::new(),
                department: String::new(),
                equipment_name: String::new(),
                link: String::new(),
                bank_name: String::new(),
                bank_branch: String::new(),
                bank_account_number: String::new(),
                amount: "0.00".into(),
                date: String::new(),
                detail: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!client.is_posting());
        assert_eq!(
            client.last_error().as_deref(),
            Some("Missing PAYMENT API configuration.")
        );
        assert_eq!(client.last_response(), None);
    }

    #[test]
    fn reset_clears_state_and_is_idempotent() {
        let client = unconfigured();
        client.state().error = Some("stale".into());
        client.reset();
        client.reset();
        assert_eq!(client.last_error(), None);
        assert_eq!(client.last_response(), None);
        assert!(!client.is_posting());
    }

    #[test]
    fn clones_share_state() {
        let client = unconfigured();
        let clone = client.clone();
        client.state().error = Some("seen by both".into());
        assert_eq!(clone.last_error().as_deref(), Some("seen by both"));
        clone.reset();
        assert_eq!(client.last_error(), None);
    }
}

//! Request handlers served under `/api/`.
//!
//! | Path | Handler |
//! |------|---------|
//! | `POST /api/create-payment-intent` | [`payment`]: donation checkout |
//! | `POST /api/volunteer` | [`volunteer`]: verified form relay |
//!
//! Handlers are plain functions from a JSON body to an [`ApiResponse`];
//! every failure becomes a JSON error with a 4xx/5xx status. Upstream
//! services sit behind traits so the handlers run against fakes in tests.

pub mod payment;
pub mod volunteer;

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::FunctionsConfig;
use crate::utils::path::strip_query;

pub use payment::{HttpGateway, PaymentGateway};
pub use volunteer::{ChallengeVerifier, HttpWebhook, TurnstileVerifier, Webhook};

pub const PAYMENT_PATH: &str = "/api/create-payment-intent";
pub const VOLUNTEER_PATH: &str = "/api/volunteer";

/// Status and JSON body of a handler response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn error_with_details(status: u16, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into(), "details": details.into() }),
        }
    }
}

/// Failure talking to an upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Turn a non-success HTTP response into [`UpstreamError::Status`].
fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let body: String = body.chars().take(200).collect();
    Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
    })
}

/// The handlers and their upstream services.
pub struct Functions {
    gateway: Box<dyn PaymentGateway>,
    default_currency: String,
    verifier: Box<dyn ChallengeVerifier>,
    webhook: Box<dyn Webhook>,
}

impl Functions {
    pub fn new(
        gateway: Box<dyn PaymentGateway>,
        default_currency: impl Into<String>,
        verifier: Box<dyn ChallengeVerifier>,
        webhook: Box<dyn Webhook>,
    ) -> Self {
        Self {
            gateway,
            default_currency: default_currency.into(),
            verifier,
            webhook,
        }
    }

    /// HTTP-backed handlers; secrets are read from the environment variables
    /// the config names.
    pub fn from_config(config: &FunctionsConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("staticize/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;

        let payment = &config.payment;
        let volunteer = &config.volunteer;
        Ok(Self::new(
            Box::new(HttpGateway::new(
                client.clone(),
                payment.endpoint.clone(),
                env_secret(&payment.api_key_env),
                payment.success_url.clone(),
                payment.cancel_url.clone(),
            )),
            &payment.default_currency,
            Box::new(TurnstileVerifier::new(
                client.clone(),
                volunteer.verify_url.clone(),
                env_secret(&volunteer.secret_env),
            )),
            Box::new(HttpWebhook::new(client, env_secret(&volunteer.webhook_env))),
        ))
    }

    /// Dispatch one request.
    pub fn handle(&self, method: &str, path: &str, body: &str) -> ApiResponse {
        let path = strip_query(path).trim_end_matches('/');
        let known = matches!(path, PAYMENT_PATH | VOLUNTEER_PATH);
        if !known {
            return ApiResponse::error(404, format!("no handler for {path}"));
        }
        if !method.eq_ignore_ascii_case("POST") {
            return ApiResponse::error(405, "method not allowed, use POST");
        }

        let body: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => return ApiResponse::error_with_details(400, "Invalid JSON body", e.to_string()),
        };

        match path {
            PAYMENT_PATH => payment::create_intent(self.gateway.as_ref(), &self.default_currency, &body),
            _ => volunteer::relay(self.verifier.as_ref(), self.webhook.as_ref(), &body),
        }
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use parking_lot::Mutex;

    use payment::{CheckoutPayload, CheckoutSession};

    /// Gateway that records payloads and answers with a fixed session.
    #[derive(Default)]
    pub struct FakeGateway {
        pub fail: bool,
        pub payloads: Mutex<Vec<Value>>,
    }

    impl PaymentGateway for FakeGateway {
        fn create_checkout(&self, payload: &CheckoutPayload) -> Result<CheckoutSession, UpstreamError> {
            self.payloads.lock().push(serde_json::to_value(payload).unwrap_or_default());
            if self.fail {
                return Err(UpstreamError::Status {
                    status: 500,
                    body: "gateway down".into(),
                });
            }
            Ok(CheckoutSession {
                id: "pi_123".into(),
                url: "https://pay.example/c/pi_123".into(),
                status: "open".into(),
            })
        }
    }

    /// Verifier accepting exactly one token.
    pub struct FakeVerifier {
        pub valid: &'static str,
        pub calls: Mutex<Vec<String>>,
    }

    impl ChallengeVerifier for FakeVerifier {
        fn verify(&self, token: &str, _remote_ip: Option<&str>) -> Result<bool, UpstreamError> {
            self.calls.lock().push(token.to_owned());
            Ok(token == self.valid)
        }
    }

    #[derive(Default)]
    pub struct FakeWebhook {
        pub fail: bool,
        pub delivered: Mutex<Vec<Value>>,
    }

    impl Webhook for FakeWebhook {
        fn deliver(&self, payload: &Value) -> Result<(), UpstreamError> {
            if self.fail {
                return Err(UpstreamError::Request("connection refused".into()));
            }
            self.delivered.lock().push(payload.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use parking_lot::Mutex;

    fn functions() -> Functions {
        Functions::new(
            Box::new(FakeGateway::default()),
            "usd",
            Box::new(FakeVerifier {
                valid: "ok-token",
                calls: Mutex::new(Vec::new()),
            }),
            Box::new(FakeWebhook::default()),
        )
    }

    #[test]
    fn test_unknown_path() {
        let response = functions().handle("POST", "/api/nope", "{}");
        assert_eq!(response.status, 404);
        assert!(response.body["error"].is_string());
    }

    #[test]
    fn test_wrong_method() {
        assert_eq!(functions().handle("GET", PAYMENT_PATH, "").status, 405);
        assert_eq!(functions().handle("PUT", "/api/volunteer/", "{}").status, 405);
    }

    #[test]
    fn test_malformed_json() {
        let response = functions().handle("POST", PAYMENT_PATH, "{amount: 5");
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Invalid JSON body");
        assert!(response.body["details"].is_string());
    }

    #[test]
    fn test_dispatch_with_query() {
        let response = functions().handle("post", "/api/create-payment-intent?src=home", r#"{"amount": 10}"#);
        assert_eq!(response.status, 200);
    }

    #[test]
    fn test_from_config_builds() {
        assert!(Functions::from_config(&FunctionsConfig::default()).is_ok());
    }

    #[test]
    fn test_upstream_status_error_display() {
        let err = UpstreamError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "upstream answered 502: bad gateway");
    }
}

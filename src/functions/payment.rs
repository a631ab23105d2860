//! `POST /api/create-payment-intent`
//!
//! Request: `{amount, currency?, isRecurring?, customerEmail?}` with
//! `amount` in major units. One-time gifts become a `payment` checkout,
//! recurring gifts a monthly `subscription`.
//!
//! Response: `{payment_url, payment_id, status}`, or `{error, details}`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ApiResponse, UpstreamError, check_status};
use crate::log;

/// Smallest accepted amount, in major units.
const MIN_AMOUNT: f64 = 1.0;

/// Largest accepted amount, in major units.
const MAX_AMOUNT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Payment,
    Subscription,
}

/// What the gateway is asked to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutPayload {
    pub mode: Mode,
    /// Minor units (cents).
    pub amount: u64,
    /// Lowercase ISO 4217 code.
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

/// What the gateway answers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub status: String,
}

pub trait PaymentGateway: Send + Sync {
    fn create_checkout(&self, payload: &CheckoutPayload) -> Result<CheckoutSession, UpstreamError>;
}

/// Gateway reached over HTTP with a bearer key.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
    success_url: Option<String>,
    cancel_url: Option<String>,
}

impl HttpGateway {
    pub fn new(
        client: reqwest::blocking::Client,
        endpoint: Option<String>,
        api_key: Option<String>,
        success_url: Option<String>,
        cancel_url: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            success_url,
            cancel_url,
        }
    }
}

impl PaymentGateway for HttpGateway {
    fn create_checkout(&self, payload: &CheckoutPayload) -> Result<CheckoutSession, UpstreamError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("functions.payment.endpoint".into()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("the payment API key".into()))?;

        let payload = CheckoutPayload {
            success_url: payload.success_url.clone().or_else(|| self.success_url.clone()),
            cancel_url: payload.cancel_url.clone().or_else(|| self.cancel_url.clone()),
            ..payload.clone()
        };
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()?;
        Ok(check_status(response)?.json::<CheckoutSession>()?)
    }
}

/// Validated request.
#[derive(Debug, Clone, PartialEq)]
struct IntentRequest {
    amount: f64,
    currency: String,
    recurring: bool,
    customer_email: Option<String>,
}

impl IntentRequest {
    fn parse(body: &Value, default_currency: &str) -> Result<Self, ApiResponse> {
        let invalid = |details: &str| ApiResponse::error_with_details(400, "Invalid payment request", details);

        let Some(object) = body.as_object() else {
            return Err(invalid("body must be a JSON object"));
        };

        let amount = match object.get("amount") {
            None | Some(Value::Null) => return Err(invalid("amount is required")),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| invalid("amount must be a number"))?,
        };
        if !amount.is_finite() || amount < MIN_AMOUNT {
            return Err(ApiResponse::error_with_details(
                400,
                "Invalid amount",
                format!("amount must be at least {MIN_AMOUNT}"),
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(ApiResponse::error_with_details(
                400,
                "Invalid amount",
                format!("amount must be at most {MAX_AMOUNT}"),
            ));
        }

        let currency = match object.get("currency") {
            None | Some(Value::Null) => default_currency.to_ascii_lowercase(),
            Some(Value::String(code))
                if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                code.to_ascii_lowercase()
            }
            Some(_) => return Err(invalid("currency must be a three-letter code")),
        };

        let recurring = match object.get("isRecurring") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(invalid("isRecurring must be a boolean")),
        };

        let customer_email = match object.get("customerEmail") {
            None | Some(Value::Null) => None,
            Some(Value::String(email)) if email.trim().is_empty() => None,
            Some(Value::String(email)) if email.contains('@') => Some(email.trim().to_owned()),
            Some(_) => return Err(invalid("customerEmail must be an email address")),
        };

        Ok(Self {
            amount,
            currency,
            recurring,
            customer_email,
        })
    }

    fn payload(&self) -> CheckoutPayload {
        let (mode, interval) = if self.recurring {
            (Mode::Subscription, Some("month"))
        } else {
            (Mode::Payment, None)
        };
        CheckoutPayload {
            mode,
            // Validated amounts fit in u64 minor units
            amount: (self.amount * 100.0).round() as u64,
            currency: self.currency.clone(),
            interval,
            customer_email: self.customer_email.clone(),
            success_url: None,
            cancel_url: None,
        }
    }
}

/// Handle a payment-intent request body.
pub fn create_intent(gateway: &dyn PaymentGateway, default_currency: &str, body: &Value) -> ApiResponse {
    let request = match IntentRequest::parse(body, default_currency) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match gateway.create_checkout(&request.payload()) {
        Ok(session) => ApiResponse::ok(json!({
            "payment_url": session.url,
            "payment_id": session.id,
            "status": session.status,
        })),
        Err(e) => {
            log!("api"; "payment: {e}");
            let error = match &e {
                UpstreamError::NotConfigured(_) => "Payment service unavailable",
                _ => "Failed to create payment",
            };
            ApiResponse::error_with_details(400, error, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::fakes::FakeGateway;

    fn call(gateway: &FakeGateway, body: Value) -> ApiResponse {
        create_intent(gateway, "usd", &body)
    }

    #[test]
    fn test_amount_below_minimum() {
        let gateway = FakeGateway::default();
        for body in [json!({"amount": 0}), json!({"amount": 0.5}), json!({"amount": -3})] {
            let response = call(&gateway, body);
            assert_eq!(response.status, 400);
            assert!(response.body["error"].is_string());
            assert!(response.body["details"].is_string());
        }
        assert!(gateway.payloads.lock().is_empty());
    }

    #[test]
    fn test_amount_above_maximum() {
        let gateway = FakeGateway::default();
        for body in [json!({"amount": 1e300}), json!({"amount": 1_000_000.01})] {
            let response = call(&gateway, body);
            assert_eq!(response.status, 400);
            assert!(response.body["details"].as_str().unwrap().contains("at most"));
        }
        assert!(gateway.payloads.lock().is_empty());

        assert_eq!(call(&gateway, json!({"amount": 1_000_000})).status, 200);
        assert_eq!(gateway.payloads.lock()[0]["amount"], 100_000_000);
    }

    #[test]
    fn test_amount_missing_or_not_number() {
        let gateway = FakeGateway::default();
        assert_eq!(call(&gateway, json!({})).status, 400);
        assert_eq!(call(&gateway, json!({"amount": "25"})).status, 400);
        assert_eq!(call(&gateway, json!([25])).status, 400);
    }

    #[test]
    fn test_recurring_donation() {
        let gateway = FakeGateway::default();
        let response = call(&gateway, json!({"amount": 25, "isRecurring": true}));
        assert_eq!(response.status, 200);
        assert!(response.body["payment_url"].is_string());
        assert!(response.body["status"].is_string());
        assert_eq!(response.body["payment_id"], "pi_123");

        let payloads = gateway.payloads.lock();
        assert_eq!(
            payloads[0],
            json!({"mode": "subscription", "amount": 2500, "currency": "usd", "interval": "month"})
        );
    }

    #[test]
    fn test_one_time_donation() {
        let gateway = FakeGateway::default();
        let response = call(
            &gateway,
            json!({"amount": 12.5, "currency": "EUR", "customerEmail": "a@b.org"}),
        );
        assert_eq!(response.status, 200);
        assert_eq!(
            gateway.payloads.lock()[0],
            json!({"mode": "payment", "amount": 1250, "currency": "eur", "customer_email": "a@b.org"})
        );
    }

    #[test]
    fn test_invalid_optional_fields() {
        let gateway = FakeGateway::default();
        assert_eq!(call(&gateway, json!({"amount": 5, "currency": "dollars"})).status, 400);
        assert_eq!(call(&gateway, json!({"amount": 5, "isRecurring": "yes"})).status, 400);
        assert_eq!(call(&gateway, json!({"amount": 5, "customerEmail": "nope"})).status, 400);
    }

    #[test]
    fn test_gateway_failure() {
        let gateway = FakeGateway {
            fail: true,
            ..Default::default()
        };
        let response = call(&gateway, json!({"amount": 10}));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Failed to create payment");
        assert!(response.body["details"].is_string());
    }

    #[test]
    fn test_http_gateway_not_configured() {
        let gateway = HttpGateway::new(reqwest::blocking::Client::new(), None, None, None, None);
        let response = create_intent(&gateway, "usd", &json!({"amount": 10}));
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Payment service unavailable");
        assert!(response.body["details"].as_str().unwrap().contains("functions.payment.endpoint"));
    }
}

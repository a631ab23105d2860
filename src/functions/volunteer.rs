//! `POST /api/volunteer`
//!
//! The applicant's form fields plus a bot-verification token (`token`, or
//! `cf-turnstile-response` as the widget names it). The token is checked
//! with the challenge service first; only a verified submission is
//! forwarded to the webhook, without the token.

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{ApiResponse, UpstreamError, check_status};
use crate::log;

const TOKEN_FIELDS: &[&str] = &["token", "cf-turnstile-response"];
const REQUIRED_FIELDS: &[&str] = &["name", "email"];

pub trait ChallengeVerifier: Send + Sync {
    /// Whether the challenge service accepts `token`.
    fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, UpstreamError>;
}

pub trait Webhook: Send + Sync {
    fn deliver(&self, payload: &Value) -> Result<(), UpstreamError>;
}

/// Turnstile-compatible `siteverify` endpoint.
pub struct TurnstileVerifier {
    client: reqwest::blocking::Client,
    url: String,
    secret: Option<String>,
}

impl TurnstileVerifier {
    pub fn new(client: reqwest::blocking::Client, url: String, secret: Option<String>) -> Self {
        Self { client, url, secret }
    }
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl ChallengeVerifier for TurnstileVerifier {
    fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<bool, UpstreamError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("the challenge secret".into()))?;

        let mut body = json!({ "secret": secret, "response": token });
        if let Some(ip) = remote_ip {
            body["remoteip"] = json!(ip);
        }
        let response = self.client.post(&self.url).json(&body).send()?;
        let verdict: VerifyResponse = check_status(response)?.json()?;
        if !verdict.success {
            log!("api"; "volunteer: challenge rejected ({})", verdict.error_codes.join(", "));
        }
        Ok(verdict.success)
    }
}

/// Webhook receiving the JSON payload by POST.
pub struct HttpWebhook {
    client: reqwest::blocking::Client,
    url: Option<String>,
}

impl HttpWebhook {
    pub fn new(client: reqwest::blocking::Client, url: Option<String>) -> Self {
        Self { client, url }
    }
}

impl Webhook for HttpWebhook {
    fn deliver(&self, payload: &Value) -> Result<(), UpstreamError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| UpstreamError::NotConfigured("the volunteer webhook".into()))?;
        check_status(self.client.post(url).json(payload).send()?)?;
        Ok(())
    }
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Handle a volunteer application body.
pub fn relay(verifier: &dyn ChallengeVerifier, webhook: &dyn Webhook, body: &Value) -> ApiResponse {
    let Some(object) = body.as_object() else {
        return ApiResponse::error(400, "Request body must be a JSON object");
    };

    let missing: Vec<_> = REQUIRED_FIELDS
        .iter()
        .filter(|field| non_empty_str(object, field).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return ApiResponse::error(400, format!("Missing required fields: {}", missing.join(", ")));
    }

    let Some(token) = TOKEN_FIELDS.iter().find_map(|key| non_empty_str(object, key)) else {
        return ApiResponse::error(400, "Missing verification token");
    };

    match verifier.verify(token, None) {
        Ok(true) => {}
        Ok(false) => return ApiResponse::error(400, "Verification failed, please try again"),
        Err(e) => {
            log!("api"; "volunteer: {e}");
            return ApiResponse::error(502, "Verification service unavailable");
        }
    }

    let mut payload = object.clone();
    for key in TOKEN_FIELDS {
        payload.remove(*key);
    }

    match webhook.deliver(&Value::Object(payload)) {
        Ok(()) => ApiResponse::ok(json!({ "success": true })),
        Err(e) => {
            log!("api"; "volunteer: {e}");
            ApiResponse::error(502, "Failed to submit application")
        }
    }
}

//! `[functions]` section configuration.
//!
//! Upstream settings for the two request handlers mounted under `/api/`.
//! Secrets never live in the config file: only the names of the environment
//! variables holding them do.
//!
//! # Example
//!
//! ```toml
//! [functions]
//! timeout_secs = 10
//!
//! [functions.payment]
//! endpoint = "https://gateway.example/v1/checkout"
//! api_key_env = "PAYMENT_API_KEY"
//! default_currency = "usd"
//!
//! [functions.volunteer]
//! verify_url = "https://challenges.cloudflare.com/turnstile/v0/siteverify"
//! secret_env = "TURNSTILE_SECRET_KEY"
//! webhook_env = "VOLUNTEER_WEBHOOK_URL"
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use macros::Config;
use serde::{Deserialize, Serialize};

/// Request handler settings.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "functions")]
pub struct FunctionsConfig {
    /// Timeout for upstream calls, in seconds.
    #[config(inline_doc)]
    pub timeout_secs: u64,

    /// Payment-intent creation.
    #[config(sub)]
    pub payment: PaymentConfig,

    /// Volunteer-form relay.
    #[config(sub)]
    pub volunteer: VolunteerConfig,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            payment: PaymentConfig::default(),
            volunteer: VolunteerConfig::default(),
        }
    }
}

/// `POST /api/create-payment-intent` upstream.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "functions.payment")]
pub struct PaymentConfig {
    /// Checkout endpoint of the payment gateway.
    #[config(inline_doc)]
    pub endpoint: Option<String>,

    /// Environment variable holding the gateway API key.
    #[config(inline_doc)]
    pub api_key_env: String,

    /// Currency used when a request names none.
    #[config(inline_doc)]
    pub default_currency: String,

    /// Where the gateway sends the donor after paying.
    #[config(inline_doc)]
    pub success_url: Option<String>,

    /// Where the gateway sends the donor after cancelling.
    #[config(inline_doc)]
    pub cancel_url: Option<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: "PAYMENT_API_KEY".into(),
            default_currency: "usd".into(),
            success_url: None,
            cancel_url: None,
        }
    }
}

/// `POST /api/volunteer` upstreams.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "functions.volunteer")]
pub struct VolunteerConfig {
    /// Challenge verification endpoint.
    #[config(inline_doc)]
    pub verify_url: String,

    /// Environment variable holding the challenge secret.
    #[config(inline_doc)]
    pub secret_env: String,

    /// Environment variable holding the webhook URL submissions go to.
    #[config(inline_doc)]
    pub webhook_env: String,
}

impl Default for VolunteerConfig {
    fn default() -> Self {
        Self {
            verify_url: "https://challenges.cloudflare.com/turnstile/v0/siteverify".into(),
            secret_env: "TURNSTILE_SECRET_KEY".into(),
            webhook_env: "VOLUNTEER_WEBHOOK_URL".into(),
        }
    }
}

impl FunctionsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.timeout_secs == 0 {
            diag.error(Self::FIELDS.timeout_secs, "must be at least 1");
        }

        let payment = &self.payment;
        for (field, value) in [
            (PaymentConfig::FIELDS.endpoint, &payment.endpoint),
            (PaymentConfig::FIELDS.success_url, &payment.success_url),
            (PaymentConfig::FIELDS.cancel_url, &payment.cancel_url),
        ] {
            if let Some(value) = value {
                check_http_url(field, value, diag);
            }
        }
        check_http_url(
            VolunteerConfig::FIELDS.verify_url,
            &self.volunteer.verify_url,
            diag,
        );

        let currency = &payment.default_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            diag.error_with_hint(
                PaymentConfig::FIELDS.default_currency,
                format!("`{currency}` is not a currency code"),
                "use a three-letter ISO 4217 code, e.g. \"usd\"",
            );
        }

        for (field, name) in [
            (PaymentConfig::FIELDS.api_key_env, &payment.api_key_env),
            (VolunteerConfig::FIELDS.secret_env, &self.volunteer.secret_env),
            (VolunteerConfig::FIELDS.webhook_env, &self.volunteer.webhook_env),
        ] {
            if name.trim().is_empty() {
                diag.error(field, "must name an environment variable");
            }
        }
    }
}

fn check_http_url(field: FieldPath, value: &str, diag: &mut ConfigDiagnostics) {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => diag.error(
            field,
            format!("scheme '{}' not supported, must be http or https", parsed.scheme()),
        ),
        Err(e) => diag.error(field, format!("invalid URL: {e}")),
    }
}

pub mod checkout_session;
pub mod response;
pub mod webhook;

pub use checkout_session::{CheckoutSession, NewCheckoutSession};
pub use response::{SessionSummary, StripeEvent};

use serde::de::DeserializeOwned;
use thiserror::Error;

use response::ApiErrorBody;

/// Credentials and API origin for one Stripe call.
#[derive(Debug, Clone)]
pub struct Auth {
    pub base: String,
    pub secret: String,
}

impl Auth {
    pub fn new(base: String, secret: String) -> Self {
        Auth { base, secret }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Error)]
pub enum StripeError {
    #[error("Stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid Stripe signature: {0}")]
    Signature(String),

    #[error("Invalid Stripe payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or(body);
    Err(StripeError::Api {
        status: status.as_u16(),
        message,
    })
}

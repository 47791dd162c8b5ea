use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{read_json, Auth, SessionSummary, StripeError};

pub const CHECKOUT_SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// A Checkout Session as Stripe returns it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckoutSession {
    pub id: Option<String>,
    pub customer: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub mode: Option<String>,
    pub url: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn valid_session_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl CheckoutSession {
    pub async fn async_get(creds: &Auth, id: &str) -> Result<Self, StripeError> {
        if !valid_session_id(id) {
            return Err(StripeError::InvalidRequest(format!(
                "Invalid checkout session id {id:?}"
            )));
        }
        let response = reqwest::Client::new()
            .get(creds.url(&format!("checkout/sessions/{id}")))
            .bearer_auth(&creds.secret)
            .send()
            .await?;
        read_json(response).await
    }

    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .get("userId")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn plan_name(&self) -> Option<&str> {
        self.metadata.get("planName").map(String::as_str)
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            payment_status: self.payment_status.clone(),
            user_id: self.user_id().map(str::to_string),
            plan_name: self.plan_name().map(str::to_string),
            amount_total: self.amount_total.map(|cents| cents as f64 / 100.0),
            currency: self.currency.clone(),
        }
    }
}

/// One-off payment for a plan, priced inline rather than with a Price id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckoutSession {
    pub plan_name: String,
    /// Minor currency units.
    pub unit_amount: i64,
    pub currency: String,
    pub quantity: u32,
    pub user_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl NewCheckoutSession {
    pub fn for_plan(plan_name: &str, price: f64, user_id: &str, client_url: &str) -> Self {
        let client_url = client_url.trim_end_matches('/');
        Self {
            plan_name: plan_name.to_string(),
            unit_amount: (price * 100.0).round() as i64,
            currency: "usd".to_string(),
            quantity: 1,
            user_id: user_id.to_string(),
            success_url: format!(
                "{client_url}/success?session_id={CHECKOUT_SESSION_ID_PLACEHOLDER}"
            ),
            cancel_url: format!("{client_url}/cancel"),
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let pairs = [
            ("payment_method_types[0]", "card".to_string()),
            ("mode", "payment".to_string()),
            ("line_items[0][price_data][currency]", self.currency.clone()),
            (
                "line_items[0][price_data][product_data][name]",
                self.plan_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                self.unit_amount.to_string(),
            ),
            ("line_items[0][quantity]", self.quantity.to_string()),
            ("metadata[userId]", self.user_id.clone()),
            ("metadata[planName]", self.plan_name.clone()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ];
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    pub async fn async_post(&self, creds: &Auth) -> Result<CheckoutSession, StripeError> {
        let response = reqwest::Client::new()
            .post(creds.url("checkout/sessions"))
            .bearer_auth(&creds.secret)
            .form(&self.to_params())
            .send()
            .await?;
        read_json(response).await
    }
}

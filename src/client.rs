use crate::config::StripeConfig;
use crate::stripe::{
    webhook, Auth, CheckoutSession, NewCheckoutSession, StripeError, StripeEvent,
};

#[derive(Debug, Clone)]
pub struct StripeClient {
    pub api_key: String,
    pub api_base: String,
    pub webhook_secret: Option<String>,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            api_key: config.secret_key.clone(),
            api_base: config.api_base.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    pub async fn create_checkout_session(
        &self,
        session: &NewCheckoutSession,
    ) -> Result<CheckoutSession, StripeError> {
        session.async_post(&self.into()).await
    }

    pub async fn retrieve_checkout_session(
        &self,
        id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        CheckoutSession::async_get(&self.into(), id).await
    }

    /// Verifies the `Stripe-Signature` header, then decodes the event.
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<StripeEvent, StripeError> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| StripeError::Signature("webhook secret not configured".into()))?;
        webhook::verify_signature(payload, signature_header, secret, now)?;
        webhook::parse_event(payload)
    }
}

impl From<&StripeClient> for Auth {
    fn from(client: &StripeClient) -> Self {
        Auth::new(client.api_base.clone(), client.api_key.clone())
    }
}

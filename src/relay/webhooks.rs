use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::{debug, info, warn};
use serde_json::json;
use sha2::Sha256;

use super::AppState;
use crate::error::AppError;
use crate::realtime::{self, ChangeEvent};
use crate::stripe::CheckoutSession;

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";
pub const SUPABASE_SECRET_HEADER: &str = "x-webhook-secret";

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

type HmacSha256 = Hmac<Sha256>;

fn keyed_tag(key: &str, value: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(value.as_bytes());
    Some(mac)
}

/// Constant-time check of the database webhook secret: both values are
/// tagged under the expected secret and the tags compared with `verify_slice`.
fn secret_matches(provided: Option<&str>, expected: &str) -> bool {
    let provided = provided.and_then(|value| keyed_tag(expected, value));
    match (provided, keyed_tag(expected, expected)) {
        (Some(mac), Some(reference)) => mac
            .verify_slice(&reference.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

pub async fn stripe(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = header(&req, STRIPE_SIGNATURE_HEADER).ok_or_else(|| {
        AppError::BadRequest(format!("Missing {STRIPE_SIGNATURE_HEADER} header"))
    })?;
    let event = state
        .stripe
        .verify_webhook(&body, signature, Utc::now().timestamp())?;
    debug!("stripe event {} ({})", event.id, event.event_type);

    if event.event_type == CHECKOUT_COMPLETED {
        let session: CheckoutSession = serde_json::from_value(event.data.object)
            .map_err(|e| AppError::BadRequest(format!("Invalid checkout session: {e}")))?;
        match session.user_id() {
            Some(user_id) if session.is_paid() => match AppState::purchased_plan(&session) {
                Ok(_) => {
                    state.upgrade_to_premium(user_id).await?;
                }
                Err(e) => warn!("not upgrading {}: {}", user_id, e),
            },
            Some(_) => info!(
                "session {} completed without payment ({:?})",
                session.id.as_deref().unwrap_or_default(),
                session.payment_status
            ),
            None => warn!(
                "session {} has no userId metadata",
                session.id.as_deref().unwrap_or_default()
            ),
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

pub async fn supabase(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    if let Some(expected) = state.supabase_webhook_secret.as_deref() {
        if !secret_matches(header(&req, SUPABASE_SECRET_HEADER), expected) {
            warn!("rejected database webhook with a bad {}", SUPABASE_SECRET_HEADER);
            return Err(AppError::Unauthorized);
        }
    }

    let event: ChangeEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid change payload: {e}")))?;
    let now = Utc::now();
    let applied = realtime::apply(&event, &state.notifications, now.date_naive(), now)
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid {} record: {e}", event.table)))?;
    Ok(HttpResponse::Ok().json(applied))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_secret_must_match_exactly() {
        assert!(secret_matches(Some("db-hook-secret"), "db-hook-secret"));
        assert!(!secret_matches(Some("db-hook-secreT"), "db-hook-secret"));
        assert!(!secret_matches(Some("db-hook"), "db-hook-secret"));
        assert!(!secret_matches(Some(""), "db-hook-secret"));
        assert!(!secret_matches(None, "db-hook-secret"));
    }
}

use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::error::AppError;
use crate::plans::{find_plan, PlanTier};
use crate::stripe::NewCheckoutSession;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default, deserialize_with = "crate::types::de::amount")]
    pub price: f64,
    #[serde(default)]
    pub user_id: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CheckoutRequest {
    fn validated(&self) -> Option<(&str, f64, &str)> {
        let plan_name = present(&self.plan_name)?;
        let user_id = present(&self.user_id)?;
        if !self.price.is_finite() || self.price <= 0.0 {
            return None;
        }
        Some((plan_name, self.price, user_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

impl SessionQuery {
    fn require(&self) -> Result<&str, AppError> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing session_id in query".into()))
    }
}

pub async fn create_checkout_session(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
    let (plan_name, price, user_id) = body
        .validated()
        .ok_or_else(|| AppError::BadRequest("Missing plan info or userId".into()))?;

    let plan = find_plan(plan_name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown plan {plan_name:?}")))?;
    if !plan.accepts_price(price) {
        warn!("rejected checkout for {} at {}", plan.name, price);
        return Err(AppError::BadRequest(format!(
            "Price does not match the {} plan",
            plan.name
        )));
    }

    let params = NewCheckoutSession::for_plan(plan.name, price, user_id, &state.client_url);
    let session = state.stripe.create_checkout_session(&params).await?;
    info!(
        "Created Stripe session: {}",
        session.id.as_deref().unwrap_or("<no id>")
    );
    Ok(HttpResponse::Ok().json(json!({ "url": session.url })))
}

pub async fn retrieve_checkout_session(
    state: web::Data<AppState>,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse, AppError> {
    let session_id = query.require()?;
    let session = state.stripe.retrieve_checkout_session(session_id).await?;
    info!("Retrieved session: {}", session_id);
    Ok(HttpResponse::Ok().json(session.summary()))
}

/// Success-page confirmation: upgrade the buyer once Stripe reports the
/// session as paid.
pub async fn confirm(
    state: web::Data<AppState>,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse, AppError> {
    let session_id = query.require()?;
    let session = state.stripe.retrieve_checkout_session(session_id).await?;
    let summary = session.summary();

    let user_id = session.user_id().ok_or_else(|| {
        AppError::BadRequest("No user ID found in Stripe session metadata".into())
    })?;

    if !session.is_paid() {
        let status = session.payment_status.as_deref().unwrap_or("unknown");
        warn!("session {} not paid (status: {})", session_id, status);
        return Err(AppError::PaymentRequired(format!(
            "Payment not completed (status: {status})"
        )));
    }

    let plan = AppState::purchased_plan(&session)?;
    info!("session {} paid for the {} plan", session_id, plan.name);
    let notification = state.upgrade_to_premium(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "plan": PlanTier::Premium,
        "session": summary,
        "notification": notification,
    })))
}

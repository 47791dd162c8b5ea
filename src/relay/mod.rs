//! HTTP surface of `subtrack-relay`: the Stripe checkout relay, webhook
//! receivers and the signed-in JSON API.

pub mod api;
pub mod billing;
pub mod webhooks;

use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use log::info;
use serde_json::json;

use crate::client::StripeClient;
use crate::config::{ServerConfig, StripeConfig, SupabaseConfig};
use crate::error::{AppError, ConfigError};
use crate::notifications::NotificationStore;
use crate::plans::{find_plan, BillingPlan, PlanTier};
use crate::stripe::CheckoutSession;
use crate::supabase::SupabaseClient;
use crate::types::Notification;

/// Shared by every worker through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub stripe: StripeClient,
    pub supabase: SupabaseClient,
    pub notifications: NotificationStore,
    pub client_url: String,
    pub supabase_webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        stripe: StripeClient,
        supabase: SupabaseClient,
        client_url: &str,
        supabase_webhook_secret: Option<String>,
    ) -> Self {
        Self {
            stripe,
            supabase,
            notifications: NotificationStore::new(),
            client_url: client_url.trim_end_matches('/').to_string(),
            supabase_webhook_secret,
        }
    }

    pub fn from_env(server: &ServerConfig) -> Result<Self, ConfigError> {
        let stripe = StripeConfig::from_env()?;
        let supabase = SupabaseConfig::from_env()?;
        Ok(Self::new(
            StripeClient::new(&stripe),
            SupabaseClient::new(&supabase),
            &server.client_url,
            supabase.webhook_secret,
        ))
    }

    /// The catalogue plan a paid session bought. Fails when the metadata
    /// names no known plan or Stripe charged something other than its price.
    pub(crate) fn purchased_plan(
        session: &CheckoutSession,
    ) -> Result<&'static BillingPlan, AppError> {
        let id = session.id.as_deref().unwrap_or_default();
        let plan = session.plan_name().and_then(find_plan).ok_or_else(|| {
            AppError::BadRequest(format!("Session {id} is not for a known plan"))
        })?;
        let currency_ok = session
            .currency
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case("usd"));
        match session.amount_total {
            Some(amount) if currency_ok && plan.accepts_cents(amount) => Ok(plan),
            _ => Err(AppError::BadRequest(format!(
                "Session {id} amount does not match the {} plan",
                plan.name
            ))),
        }
    }

    /// Sets the user's plan to premium and records the change in their inbox.
    pub(crate) async fn upgrade_to_premium(
        &self,
        user_id: &str,
    ) -> Result<Option<Notification>, AppError> {
        let previous = self
            .supabase
            .get_profile(user_id)
            .await?
            .map(|profile| profile.plan)
            .unwrap_or_default();
        self.supabase.update_plan(user_id, PlanTier::Premium).await?;
        info!("upgraded {} from {} to premium", user_id, previous);
        let now = Utc::now();
        Ok(self
            .notifications
            .with_inbox(user_id, |inbox| {
                inbox.on_plan_change(previous, PlanTier::Premium, now)
            })
            .await)
    }
}

async fn ping() -> impl Responder {
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

/// Malformed bodies and query strings answer with the same JSON error shape
/// as the handlers.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| AppError::BadRequest(err.to_string()).into()),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    cfg.route("/ping", web::get().to(ping))
        .route("/health", web::get().to(health))
        .route(
            "/create-checkout-session",
            web::post().to(billing::create_checkout_session),
        )
        .route(
            "/retrieve-checkout-session",
            web::get().to(billing::retrieve_checkout_session),
        )
        .route("/billing/confirm", web::post().to(billing::confirm))
        .route("/webhooks/stripe", web::post().to(webhooks::stripe))
        .route("/webhooks/supabase", web::post().to(webhooks::supabase))
        .service(
            web::scope("/api")
                .route("/me", web::get().to(api::me))
                .route("/me", web::put().to(api::update_me))
                .route("/dashboard", web::get().to(api::dashboard))
                .route("/subscriptions", web::get().to(api::list_subscriptions))
                .route("/subscriptions", web::post().to(api::create_subscription))
                .route("/subscriptions/{id}", web::put().to(api::update_subscription))
                .route("/subscriptions/{id}", web::delete().to(api::delete_subscription))
                .route("/savings", web::get().to(api::savings))
                .route("/plans", web::get().to(api::plans))
                .route("/notifications", web::get().to(api::notifications))
                .route(
                    "/notifications/read-all",
                    web::post().to(api::mark_all_notifications_read),
                )
                .route(
                    "/notifications/{id}/read",
                    web::post().to(api::mark_notification_read),
                ),
        );
}

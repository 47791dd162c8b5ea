//! Signed-in JSON API. Every handler takes an [`AuthUser`] and talks to
//! Supabase as that user.

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::auth::AuthUser;
use crate::dashboard::{self, DashboardQuery};
use crate::error::AppError;
use crate::plans::{self, check_subscription_limit};
use crate::renewal::classify;
use crate::savings::{self, SavingsSort};
use crate::supabase::SupabaseClient;
use crate::types::{NewSubscription, Profile, ProfileUpdate, Subscription};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn load_profile(client: &SupabaseClient, user: &AuthUser) -> Result<Profile, AppError> {
    Ok(client
        .get_profile(&user.id)
        .await?
        .unwrap_or_else(|| user.fallback_profile()))
}

/// Loads stored notifications on the first call for a user, then merges
/// renewal alerts for `subs`.
async fn sync_inbox(
    state: &AppState,
    client: &SupabaseClient,
    user: &AuthUser,
    subs: &[Subscription],
) {
    let today = today();
    let loaded = state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.is_loaded())
        .await;
    let stored = if loaded {
        Vec::new()
    } else {
        client.list_notifications(&user.id).await.unwrap_or_else(|e| {
            warn!("could not load stored notifications for {}: {}", user.id, e);
            Vec::new()
        })
    };
    state
        .notifications
        .with_inbox(&user.id, |inbox| {
            if !inbox.is_loaded() {
                inbox.load_stored(&stored, today);
                inbox.mark_loaded();
            }
            inbox.merge_renewal_alerts(subs, today);
        })
        .await;
}

fn validated(form: NewSubscription) -> Result<NewSubscription, AppError> {
    let form = form.normalized();
    form.validate().map_err(AppError::BadRequest)?;
    Ok(form)
}

pub async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let client = user.supabase(&state);
    let profile = load_profile(&client, &user).await?;
    Ok(HttpResponse::Ok().json(json!({
        "id": user.id,
        "email": user.email,
        "displayName": profile.display_name(),
        "profile": profile,
    })))
}

pub async fn update_me(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
    let update = body.into_inner();
    let client = user.supabase(&state);
    let profile = match client.upsert_profile(&user.id, &update).await? {
        Some(profile) => profile,
        None => load_profile(&client, &user).await?,
    };
    info!("profile updated for {}", user.id);
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn dashboard(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, AppError> {
    let client = user.supabase(&state);
    let profile = load_profile(&client, &user).await?;
    let subs = client.list_subscriptions(&user.id).await?;
    let payments = client.list_payments(&user.id).await.unwrap_or_else(|e| {
        warn!("payments unavailable for {}: {}", user.id, e);
        Vec::new()
    });

    sync_inbox(&state, &client, &user, &subs).await;
    let unread = state.notifications.unread_count(&user.id).await;

    let view = dashboard::build_view(profile, &subs, &payments, &query, today(), unread)
        .map_err(AppError::BadRequest)?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn list_subscriptions(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let subs = user.supabase(&state).list_subscriptions(&user.id).await?;
    let today = today();
    let rows: Vec<_> = subs
        .into_iter()
        .map(|sub| {
            let status = classify(sub.next_renewal_date, today);
            json!({ "subscription": sub, "status": status })
        })
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

pub async fn create_subscription(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewSubscription>,
) -> Result<HttpResponse, AppError> {
    let form = validated(body.into_inner())?;
    let client = user.supabase(&state);

    let profile = load_profile(&client, &user).await?;
    let existing = client.count_subscriptions(&user.id).await?;
    check_subscription_limit(profile.plan, existing)?;

    let sub = client
        .insert_subscription(&user.id, &form)
        .await?
        .ok_or_else(|| AppError::Internal("insert returned no row".into()))?;
    info!("{} added subscription {}", user.id, sub.name);

    let today = today();
    state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.on_subscription_change(&sub, today))
        .await;
    Ok(HttpResponse::Created().json(sub))
}

pub async fn update_subscription(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Json<NewSubscription>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let form = validated(body.into_inner())?;
    let sub = user
        .supabase(&state)
        .update_subscription(&id, &user.id, &form)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Subscription {id} not found")))?;

    let today = today();
    state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.on_subscription_change(&sub, today))
        .await;
    Ok(HttpResponse::Ok().json(sub))
}

pub async fn delete_subscription(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !user.supabase(&state).delete_subscription(&id, &user.id).await? {
        return Err(AppError::NotFound(format!("Subscription {id} not found")));
    }
    state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.on_subscription_removed(&id))
        .await;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Default, Deserialize)]
pub struct SavingsQuery {
    #[serde(default)]
    pub sort: SavingsSort,
}

pub async fn savings(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<SavingsQuery>,
) -> Result<HttpResponse, AppError> {
    let client = user.supabase(&state);
    let subs = client.list_subscriptions(&user.id).await?;

    // Only rows cheaper than the priciest subscription in a category can
    // ever be recommended.
    let mut ceilings: Vec<(&str, f64)> = Vec::new();
    for sub in &subs {
        match ceilings.iter_mut().find(|(c, _)| *c == sub.category) {
            Some((_, ceiling)) => *ceiling = ceiling.max(sub.amount),
            None => ceilings.push((sub.category.as_str(), sub.amount)),
        }
    }
    let mut alternatives = Vec::new();
    for (category, ceiling) in ceilings {
        alternatives.extend(client.list_alternatives(category, Some(ceiling)).await?);
    }

    Ok(HttpResponse::Ok().json(savings::build_report(&subs, &alternatives, query.sort)))
}

pub async fn plans(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let profile = load_profile(&user.supabase(&state), &user).await?;
    Ok(HttpResponse::Ok().json(json!({
        "currentPlan": profile.plan,
        "taxRate": plans::TAX_RATE,
        "plans": plans::quotes(),
    })))
}

pub async fn notifications(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let loaded = state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.is_loaded())
        .await;
    if !loaded {
        let client = user.supabase(&state);
        let subs = client.list_subscriptions(&user.id).await?;
        sync_inbox(&state, &client, &user, &subs).await;
    }
    let list = state.notifications.list(&user.id).await;
    let unread = list.iter().filter(|n| !n.read).count();
    Ok(HttpResponse::Ok().json(json!({ "notifications": list, "unread": unread })))
}

pub async fn mark_notification_read(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let found = state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.mark_read(&id))
        .await;
    if !found {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    let unread = state.notifications.unread_count(&user.id).await;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "read": true, "unread": unread })))
}

pub async fn mark_all_notifications_read(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    state
        .notifications
        .with_inbox(&user.id, |inbox| inbox.mark_all_read())
        .await;
    Ok(HttpResponse::Ok().json(json!({ "unread": 0 })))
}

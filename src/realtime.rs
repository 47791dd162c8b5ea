//! Row-change payloads from Supabase (database webhooks, or the realtime
//! `eventType`/`new`/`old` shape) applied to the notification inboxes.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notifications::NotificationStore;
use crate::plans::PlanTier;
use crate::types::{Notification, Profile, StoredNotification, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type", alias = "eventType")]
    pub change: ChangeType,
    pub table: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default, alias = "new")]
    pub record: Option<Value>,
    #[serde(default, alias = "old")]
    pub old_record: Option<Value>,
}

/// What an event did to the inboxes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Applied {
    Alert {
        user_id: String,
        notification: Notification,
    },
    Removed {
        inboxes: usize,
    },
    PlanChanged {
        user_id: String,
        notification: Notification,
    },
    Stored {
        user_id: String,
        notification: Notification,
    },
    Ignored {
        reason: String,
    },
}

fn ignored(reason: impl Into<String>) -> Applied {
    Applied::Ignored {
        reason: reason.into(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(
    row: &Option<Value>,
) -> Result<Option<T>, serde_json::Error> {
    match row {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone()).map(Some),
        _ => Ok(None),
    }
}

fn old_plan(event: &ChangeEvent) -> Option<PlanTier> {
    let plan = event.old_record.as_ref()?.get("plan")?;
    serde_json::from_value(plan.clone()).ok()
}

pub async fn apply(
    event: &ChangeEvent,
    store: &NotificationStore,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Applied, serde_json::Error> {
    debug!("realtime {:?} on {}", event.change, event.table);
    let applied = match (event.table.as_str(), event.change) {
        ("subscriptions", ChangeType::Delete) => {
            let Some(old) = decode::<Subscription>(&event.old_record)? else {
                return Ok(ignored("delete without old record"));
            };
            let inboxes = match old.user_id.as_deref() {
                Some(owner) => {
                    let removed = store
                        .with_inbox(owner, |inbox| inbox.on_subscription_removed(&old.id))
                        .await;
                    usize::from(removed)
                }
                None => store.remove_subscription_everywhere(&old.id).await,
            };
            Applied::Removed { inboxes }
        }
        ("subscriptions", _) => {
            let Some(sub) = decode::<Subscription>(&event.record)? else {
                return Ok(ignored("missing record"));
            };
            let Some(owner) = sub.user_id.clone() else {
                return Ok(ignored("subscription without user_id"));
            };
            match store
                .with_inbox(&owner, |inbox| inbox.on_subscription_change(&sub, today))
                .await
            {
                Some(notification) => Applied::Alert {
                    user_id: owner,
                    notification,
                },
                None => ignored("subscription is not due"),
            }
        }
        ("profiles", ChangeType::Update) => {
            let Some(profile) = decode::<Profile>(&event.record)? else {
                return Ok(ignored("missing record"));
            };
            let (Some(owner), Some(old)) = (profile.id.clone(), old_plan(event)) else {
                return Ok(ignored("profile update without id or previous plan"));
            };
            match store
                .with_inbox(&owner, |inbox| inbox.on_plan_change(old, profile.plan, now))
                .await
            {
                Some(notification) => {
                    info!("plan for {} changed to {}", owner, profile.plan);
                    Applied::PlanChanged {
                        user_id: owner,
                        notification,
                    }
                }
                None => ignored("plan unchanged"),
            }
        }
        ("notifications", ChangeType::Insert) => {
            let Some(row) = decode::<StoredNotification>(&event.record)? else {
                return Ok(ignored("missing record"));
            };
            let Some(owner) = row.user_id.clone() else {
                return Ok(ignored("notification without user_id"));
            };
            match store
                .with_inbox(&owner, |inbox| inbox.on_stored_insert(&row, today))
                .await
            {
                Some(notification) => Applied::Stored {
                    user_id: owner,
                    notification,
                },
                None => ignored("notification already in inbox"),
            }
        }
        (table, change) => ignored(format!("{change:?} on {table} is not tracked")),
    };
    Ok(applied)
}

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::NotificationCenter;
use crate::types::Notification;

/// Inboxes keyed by user id, shared across relay workers.
#[derive(Clone, Default)]
pub struct NotificationStore {
    inner: Arc<Mutex<HashMap<String, NotificationCenter>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the user's inbox. A user without one gets a fresh
    /// inbox, kept only if `f` stored something or marked it loaded.
    pub async fn with_inbox<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut NotificationCenter) -> R,
    ) -> R {
        let mut store = self.inner.lock().await;
        if let Some(center) = store.get_mut(user_id) {
            return f(center);
        }
        let mut center = NotificationCenter::new();
        let result = f(&mut center);
        if center.is_loaded() || !center.is_empty() {
            store.insert(user_id.to_string(), center);
        }
        result
    }

    /// Number of users holding an inbox.
    pub async fn inbox_count(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn list(&self, user_id: &str) -> Vec<Notification> {
        let store = self.inner.lock().await;
        store
            .get(user_id)
            .map(|center| center.list().to_vec())
            .unwrap_or_default()
    }

    pub async fn unread_count(&self, user_id: &str) -> usize {
        let store = self.inner.lock().await;
        store.get(user_id).map_or(0, NotificationCenter::unread_count)
    }

    /// Drops a subscription's alert from every inbox. Used when a delete
    /// payload does not say who owned the row.
    pub async fn remove_subscription_everywhere(&self, subscription_id: &str) -> usize {
        let mut store = self.inner.lock().await;
        store
            .values_mut()
            .map(|center| center.on_subscription_removed(subscription_id))
            .filter(|removed| *removed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::PlanTier;
    use chrono::Utc;

    #[tokio::test]
    async fn inboxes_are_per_user_and_shared_between_clones() {
        let store = NotificationStore::new();
        let handle = store.clone();
        handle
            .with_inbox("u-1", |inbox| {
                inbox.on_plan_change(PlanTier::Free, PlanTier::Premium, Utc::now())
            })
            .await;

        assert_eq!(store.unread_count("u-1").await, 1);
        assert_eq!(store.unread_count("u-2").await, 0);
        assert!(store.list("u-2").await.is_empty());
    }

    #[tokio::test]
    async fn removal_without_owner_reaches_every_inbox() {
        use crate::types::{BillingCycle, Subscription};

        let today = chrono::NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let overdue = Subscription {
            id: "42".into(),
            user_id: Some("u-1".into()),
            name: "Netflix".into(),
            category: "Streaming".into(),
            amount: 15.49,
            currency: "USD".into(),
            billing_cycle: BillingCycle::Monthly,
            next_renewal_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 1),
            notes: None,
        };
        let store = NotificationStore::new();
        store
            .with_inbox("u-1", |inbox| inbox.on_subscription_change(&overdue, today))
            .await;
        store.with_inbox("u-2", |_| ()).await;

        assert_eq!(store.remove_subscription_everywhere("42").await, 1);
        assert_eq!(store.unread_count("u-1").await, 0);
        assert_eq!(store.remove_subscription_everywhere("42").await, 0);
    }

    #[tokio::test]
    async fn unknown_users_leave_no_inbox_behind() {
        let store = NotificationStore::new();
        assert!(!store.with_inbox("u-9", |inbox| inbox.mark_read("1")).await);
        store.with_inbox("u-9", |inbox| inbox.mark_all_read()).await;
        assert_eq!(store.inbox_count().await, 0);

        store.with_inbox("u-1", |inbox| inbox.mark_loaded()).await;
        assert_eq!(store.inbox_count().await, 1);
    }
}

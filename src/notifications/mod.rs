//! Per-user notification inbox with renewal-alert de-duplication.

mod store;

pub use store::NotificationStore;

use chrono::{DateTime, NaiveDate, Utc};

use crate::plans::PlanTier;
use crate::renewal::{alert_message, classify, RenewalStatus};
use crate::types::{Notification, NotificationKind, StoredNotification, Subscription};

/// Most entries an inbox keeps; the oldest fall off first.
pub const MAX_ENTRIES: usize = 50;

/// Newest-first list of notifications for one user.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
    loaded: bool,
}

fn renewal_alert(sub: &Subscription, today: NaiveDate) -> Option<Notification> {
    let renewal = sub.next_renewal_date?;
    let status = classify(Some(renewal), today);
    if !status.is_alert() {
        return None;
    }
    let kind = match status {
        RenewalStatus::Overdue => NotificationKind::Overdue,
        _ => NotificationKind::DueSoon,
    };
    let message = alert_message(&sub.name, renewal, status)?;
    Some(Notification {
        id: sub.id.clone(),
        kind,
        message,
        date: renewal,
        read: false,
    })
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once stored rows and renewal alerts have been merged in.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub fn list(&self) -> &[Notification] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|n| n.id == id)
    }

    fn trim(&mut self) {
        self.entries.truncate(MAX_ENTRIES);
    }

    /// Prepends alerts for overdue and due-soon subscriptions whose id is not
    /// already in the inbox. Entries already present are left alone, read
    /// state included. Returns how many were added.
    pub fn merge_renewal_alerts(&mut self, subs: &[Subscription], today: NaiveDate) -> usize {
        let fresh: Vec<Notification> = subs
            .iter()
            .filter_map(|sub| renewal_alert(sub, today))
            .filter(|alert| !self.contains(&alert.id))
            .collect();
        let added = fresh.len();
        self.entries.splice(0..0, fresh);
        self.trim();
        added
    }

    /// Replaces the alert for `sub` with a fresh unread one. Returns `None`
    /// when the change leaves the subscription upcoming.
    pub fn on_subscription_change(
        &mut self,
        sub: &Subscription,
        today: NaiveDate,
    ) -> Option<Notification> {
        let alert = renewal_alert(sub, today)?;
        self.entries.retain(|n| n.id != alert.id);
        self.entries.insert(0, alert.clone());
        self.trim();
        Some(alert)
    }

    pub fn on_subscription_removed(&mut self, subscription_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|n| n.id != subscription_id);
        before != self.entries.len()
    }

    pub fn on_plan_change(
        &mut self,
        old: PlanTier,
        new: PlanTier,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if old == new {
            return None;
        }
        let notification = Notification {
            id: format!("plan-{}", now.timestamp_millis()),
            kind: NotificationKind::PlanChanged,
            message: format!(
                "Your subscription plan changed to {}",
                new.as_str().to_uppercase()
            ),
            date: now.date_naive(),
            read: false,
        };
        self.entries.insert(0, notification.clone());
        self.trim();
        Some(notification)
    }

    /// Merges rows read from the `notifications` table, newest first.
    pub fn load_stored(&mut self, rows: &[StoredNotification], today: NaiveDate) {
        let mut rows: Vec<&StoredNotification> = rows.iter().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        for row in rows {
            let entry = Notification::from_stored(row, today);
            if !self.contains(&entry.id) {
                self.entries.push(entry);
            }
        }
        self.trim();
    }

    pub fn on_stored_insert(
        &mut self,
        row: &StoredNotification,
        today: NaiveDate,
    ) -> Option<Notification> {
        let entry = Notification::from_stored(row, today);
        if self.contains(&entry.id) {
            return None;
        }
        self.entries.insert(0, entry.clone());
        self.trim();
        Some(entry)
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        self.entries.iter_mut().for_each(|n| n.read = true);
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BillingCycle;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn sub(id: &str, name: &str, renewal: Option<(u32, u32)>) -> Subscription {
        Subscription {
            id: id.into(),
            user_id: Some("u-1".into()),
            name: name.into(),
            category: "Streaming".into(),
            amount: 10.0,
            currency: "USD".into(),
            billing_cycle: BillingCycle::Monthly,
            next_renewal_date: renewal.and_then(|(m, d)| NaiveDate::from_ymd_opt(2026, m, d)),
            notes: None,
        }
    }

    #[test]
    fn merge_skips_upcoming_and_duplicates() {
        let mut center = NotificationCenter::new();
        let subs = vec![
            sub("1", "Netflix", Some((10, 10))),
            sub("2", "Spotify", Some((10, 16))),
            sub("3", "Dropbox", Some((12, 1))),
            sub("4", "Gym", None),
        ];
        assert_eq!(center.merge_renewal_alerts(&subs, today()), 2);
        assert!(center.mark_read("1"));

        assert_eq!(center.merge_renewal_alerts(&subs, today()), 0);
        assert_eq!(center.list().len(), 2);
        assert!(center.list().iter().find(|n| n.id == "1").unwrap().read);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn merge_prepends_new_alerts() {
        let mut center = NotificationCenter::new();
        center.merge_renewal_alerts(&[sub("1", "Netflix", Some((10, 10)))], today());
        center.merge_renewal_alerts(
            &[sub("1", "Netflix", Some((10, 10))), sub("2", "Hulu", Some((10, 15)))],
            today(),
        );
        let ids: Vec<&str> = center.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn change_replaces_entry_and_resets_read() {
        let mut center = NotificationCenter::new();
        center.merge_renewal_alerts(
            &[sub("1", "Netflix", Some((10, 15))), sub("2", "Hulu", Some((10, 15)))],
            today(),
        );
        center.mark_all_read();

        let alert = center
            .on_subscription_change(&sub("1", "Netflix", Some((10, 1))), today())
            .unwrap();
        assert_eq!(alert.kind, NotificationKind::Overdue);
        assert_eq!(alert.message, "Netflix is overdue!");
        assert_eq!(center.list().len(), 2);
        assert_eq!(center.list()[0].id, "1");
        assert!(!center.list()[0].read);
        assert_eq!(center.unread_count(), 1);
    }

    #[test]
    fn change_to_upcoming_keeps_inbox() {
        let mut center = NotificationCenter::new();
        center.merge_renewal_alerts(&[sub("1", "Netflix", Some((10, 15)))], today());
        assert!(center
            .on_subscription_change(&sub("1", "Netflix", Some((11, 30))), today())
            .is_none());
        assert_eq!(center.list().len(), 1);
        assert!(center.on_subscription_removed("1"));
        assert!(center.list().is_empty());
    }

    #[test]
    fn plan_change_only_when_different() {
        let mut center = NotificationCenter::new();
        let now = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
        assert!(center
            .on_plan_change(PlanTier::Free, PlanTier::Free, now)
            .is_none());
        let n = center
            .on_plan_change(PlanTier::Free, PlanTier::Premium, now)
            .unwrap();
        assert_eq!(n.message, "Your subscription plan changed to PREMIUM");
        assert_eq!(n.id, format!("plan-{}", now.timestamp_millis()));
        assert_eq!(n.kind, NotificationKind::PlanChanged);
    }

    #[test]
    fn stored_rows_are_newest_first_and_inserts_prepend() {
        let mut center = NotificationCenter::new();
        let row = |id: &str, day: u32| StoredNotification {
            id: id.into(),
            user_id: Some("u-1".into()),
            message: format!("message {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 10, day, 0, 0, 0).single(),
        };
        center.load_stored(&[row("a", 1), row("b", 5)], today());
        let ids: Vec<&str> = center.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["stored-b", "stored-a"]);

        assert!(center.on_stored_insert(&row("c", 14), today()).is_some());
        assert!(center.on_stored_insert(&row("c", 14), today()).is_none());
        assert_eq!(center.list()[0].id, "stored-c");
        assert_eq!(center.list()[0].date, today());
    }

    #[test]
    fn inbox_keeps_only_the_newest_entries() {
        let mut center = NotificationCenter::new();
        let rows: Vec<StoredNotification> = (0..MAX_ENTRIES + 10)
            .map(|i| StoredNotification {
                id: i.to_string(),
                user_id: Some("u-1".into()),
                message: format!("message {i}"),
                created_at: Utc.timestamp_opt(1_790_000_000 + i as i64 * 60, 0).single(),
            })
            .collect();
        center.load_stored(&rows, today());
        assert_eq!(center.list().len(), MAX_ENTRIES);
        assert_eq!(center.list()[0].id, format!("stored-{}", MAX_ENTRIES + 9));

        let now = Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 0).unwrap();
        center.on_plan_change(PlanTier::Free, PlanTier::Premium, now);
        center.merge_renewal_alerts(&[sub("1", "Netflix", Some((10, 10)))], today());
        assert_eq!(center.list().len(), MAX_ENTRIES);
        assert_eq!(center.list()[0].id, "1");
        assert_eq!(center.list()[1].kind, NotificationKind::PlanChanged);
    }
}

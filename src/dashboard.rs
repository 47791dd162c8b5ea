use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::plans::PlanTier;
use crate::renewal::{classify, RenewalStatus};
use crate::types::payment::{previous_amount, Trend};
use crate::types::{Payment, Profile, Subscription};

pub const ALL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Name,
    Amount,
    NextRenewalDate,
}

/// Dashboard search/filter/sort controls. `"All"` (or empty) disables a filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: SortOption,
}

fn selected(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case(ALL))
}

impl DashboardQuery {
    pub fn status_filter(&self) -> Result<Option<RenewalStatus>, String> {
        selected(&self.status)
            .map(str::parse::<RenewalStatus>)
            .transpose()
    }

    fn matches(
        &self,
        sub: &Subscription,
        status: RenewalStatus,
        wanted: Option<RenewalStatus>,
    ) -> bool {
        let search = self.search.trim().to_lowercase();
        let matches_search = search.is_empty() || sub.name.to_lowercase().contains(&search);
        let matches_category = selected(&self.category).map_or(true, |c| sub.category == c);
        let matches_status = wanted.map_or(true, |w| w == status);
        matches_search && matches_category && matches_status
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRowView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub status: RenewalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

fn compare(a: &Subscription, b: &Subscription, sort: SortOption) -> Ordering {
    match sort {
        SortOption::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortOption::Amount => a.amount.total_cmp(&b.amount),
        SortOption::NextRenewalDate => match (a.next_renewal_date, b.next_renewal_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

pub fn filter_and_sort(
    subs: &[Subscription],
    query: &DashboardQuery,
    today: NaiveDate,
) -> Result<Vec<(Subscription, RenewalStatus)>, String> {
    let wanted = query.status_filter()?;
    let mut rows: Vec<(Subscription, RenewalStatus)> = subs
        .iter()
        .map(|sub| (sub.clone(), classify(sub.next_renewal_date, today)))
        .filter(|(sub, status)| query.matches(sub, *status, wanted))
        .collect();
    rows.sort_by(|(a, _), (b, _)| compare(a, b, query.sort));
    Ok(rows)
}

/// `"All"` followed by each category in the order first seen.
pub fn categories(subs: &[Subscription]) -> Vec<String> {
    let mut out = vec![ALL.to_string()];
    for sub in subs {
        if !out.iter().skip(1).any(|c| c == &sub.category) {
            out.push(sub.category.clone());
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub name: String,
    pub value: usize,
}

pub fn category_counts(subs: &[Subscription]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for sub in subs {
        match counts.iter_mut().find(|c| c.name == sub.category) {
            Some(entry) => entry.value += 1,
            None => counts.push(CategoryCount {
                name: sub.category.clone(),
                value: 1,
            }),
        }
    }
    counts
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlySpend {
    pub month: String,
    pub total: f64,
}

/// Spending grouped by the month of each next renewal.
pub fn monthly_spending(subs: &[Subscription]) -> Vec<MonthlySpend> {
    let mut months: Vec<MonthlySpend> = Vec::new();
    for sub in subs {
        let Some(renewal) = sub.next_renewal_date else {
            continue;
        };
        let month = renewal.format("%b").to_string();
        match months.iter_mut().find(|m| m.month == month) {
            Some(entry) => entry.total += sub.amount,
            None => months.push(MonthlySpend {
                month,
                total: sub.amount,
            }),
        }
    }
    months
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub profile: Profile,
    pub plan: PlanTier,
    pub subscriptions: Vec<SubscriptionRowView>,
    pub categories: Vec<String>,
    pub statuses: Vec<&'static str>,
    pub category_counts: Vec<CategoryCount>,
    pub monthly_spending: Vec<MonthlySpend>,
    pub unread_notifications: usize,
}

/// Charts and category options always cover every subscription; only the
/// list honours the query.
pub fn build_view(
    profile: Profile,
    subs: &[Subscription],
    payments: &[Payment],
    query: &DashboardQuery,
    today: NaiveDate,
    unread_notifications: usize,
) -> Result<DashboardView, String> {
    let rows = filter_and_sort(subs, query, today)?
        .into_iter()
        .map(|(subscription, status)| {
            let previous_amount = previous_amount(payments, &subscription.id);
            SubscriptionRowView {
                trend: previous_amount.map(|prev| Trend::between(prev, subscription.amount)),
                previous_amount,
                subscription,
                status,
            }
        })
        .collect();

    Ok(DashboardView {
        plan: profile.plan,
        profile,
        subscriptions: rows,
        categories: categories(subs),
        statuses: vec![
            ALL,
            RenewalStatus::Upcoming.label(),
            RenewalStatus::DueSoon.label(),
            RenewalStatus::Overdue.label(),
        ],
        category_counts: category_counts(subs),
        monthly_spending: monthly_spending(subs),
        unread_notifications,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BillingCycle;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn sub(
        id: &str,
        name: &str,
        category: &str,
        amount: f64,
        renewal: Option<(u32, u32)>,
    ) -> Subscription {
        Subscription {
            id: id.into(),
            user_id: None,
            name: name.into(),
            category: category.into(),
            amount,
            currency: "USD".into(),
            billing_cycle: BillingCycle::Monthly,
            next_renewal_date: renewal.and_then(|(m, d)| NaiveDate::from_ymd_opt(2026, m, d)),
            notes: None,
        }
    }

    fn fixture() -> Vec<Subscription> {
        vec![
            sub("1", "netflix", "Streaming", 15.49, Some((10, 12))),
            sub("2", "Spotify", "Music", 9.99, Some((10, 16))),
            sub("3", "Hulu", "Streaming", 7.99, Some((11, 2))),
            sub("4", "Gym", "Fitness", 30.0, None),
        ]
    }

    fn names(rows: &[(Subscription, RenewalStatus)]) -> Vec<&str> {
        rows.iter().map(|(s, _)| s.name.as_str()).collect()
    }

    #[test]
    fn default_query_sorts_by_name_case_insensitively() {
        let rows = filter_and_sort(&fixture(), &DashboardQuery::default(), today()).unwrap();
        assert_eq!(names(&rows), vec!["Gym", "Hulu", "netflix", "Spotify"]);
        assert_eq!(rows[0].1, RenewalStatus::Upcoming);
        assert_eq!(rows[2].1, RenewalStatus::Overdue);
    }

    #[test]
    fn filters_combine() {
        let query = DashboardQuery {
            search: "U".into(),
            category: Some("Streaming".into()),
            status: Some("All".into()),
            sort: SortOption::Amount,
        };
        let rows = filter_and_sort(&fixture(), &query, today()).unwrap();
        assert_eq!(names(&rows), vec!["Hulu"]);

        let query = DashboardQuery {
            status: Some("Due Soon".into()),
            ..Default::default()
        };
        let rows = filter_and_sort(&fixture(), &query, today()).unwrap();
        assert_eq!(names(&rows), vec!["Spotify"]);
    }

    #[test]
    fn unknown_status_filter_is_rejected() {
        let query = DashboardQuery {
            status: Some("Someday".into()),
            ..Default::default()
        };
        assert!(filter_and_sort(&fixture(), &query, today()).is_err());
    }

    #[test]
    fn renewal_sort_puts_missing_dates_last() {
        let query = DashboardQuery {
            sort: SortOption::NextRenewalDate,
            ..Default::default()
        };
        let rows = filter_and_sort(&fixture(), &query, today()).unwrap();
        assert_eq!(names(&rows), vec!["netflix", "Spotify", "Hulu", "Gym"]);
    }

    #[test]
    fn chart_series() {
        let subs = fixture();
        assert_eq!(categories(&subs), vec!["All", "Streaming", "Music", "Fitness"]);
        assert_eq!(
            category_counts(&subs)[0],
            CategoryCount {
                name: "Streaming".into(),
                value: 2
            }
        );
        let spend = monthly_spending(&subs);
        assert_eq!(spend.len(), 2);
        assert_eq!(spend[0].month, "Oct");
        assert!((spend[0].total - 25.48).abs() < 1e-9);
        assert_eq!(spend[1].month, "Nov");
    }

    #[test]
    fn view_annotates_trend_from_payments() {
        let payments = vec![Payment {
            id: "p1".into(),
            subscription_id: "2".into(),
            amount: 8.99,
            paid_at: None,
        }];
        let view = build_view(
            Profile::fallback("u-1", Some("ada@example.com")),
            &fixture(),
            &payments,
            &DashboardQuery::default(),
            today(),
            3,
        )
        .unwrap();
        let spotify = view
            .subscriptions
            .iter()
            .find(|r| r.subscription.id == "2")
            .unwrap();
        assert_eq!(spotify.trend, Some(Trend::Up));
        assert_eq!(view.plan, PlanTier::Free);
        assert_eq!(view.unread_notifications, 3);
        assert_eq!(view.statuses, vec!["All", "Upcoming", "Due Soon", "Overdue"]);
    }
}

//! Renewal status of a subscription relative to a calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Renewals this many days out (or fewer) count as due soon.
pub const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenewalStatus {
    Upcoming,
    #[serde(rename = "Due Soon")]
    DueSoon,
    Overdue,
}

impl RenewalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RenewalStatus::Upcoming => "Upcoming",
            RenewalStatus::DueSoon => "Due Soon",
            RenewalStatus::Overdue => "Overdue",
        }
    }

    /// Whether this status produces a renewal alert.
    pub fn is_alert(&self) -> bool {
        !matches!(self, RenewalStatus::Upcoming)
    }
}

impl fmt::Display for RenewalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RenewalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "upcoming" => Ok(RenewalStatus::Upcoming),
            "due soon" | "duesoon" => Ok(RenewalStatus::DueSoon),
            "overdue" => Ok(RenewalStatus::Overdue),
            other => Err(format!("unknown renewal status {other:?}")),
        }
    }
}

/// Compares whole days only; a renewal dated today is due soon, not overdue.
/// No date at all counts as upcoming.
pub fn classify(next_renewal_date: Option<NaiveDate>, today: NaiveDate) -> RenewalStatus {
    let Some(renewal) = next_renewal_date else {
        return RenewalStatus::Upcoming;
    };
    if renewal < today {
        RenewalStatus::Overdue
    } else if (renewal - today).num_days() <= DUE_SOON_DAYS {
        RenewalStatus::DueSoon
    } else {
        RenewalStatus::Upcoming
    }
}

pub fn alert_message(name: &str, renewal: NaiveDate, status: RenewalStatus) -> Option<String> {
    match status {
        RenewalStatus::Overdue => Some(format!("{name} is overdue!")),
        RenewalStatus::DueSoon => Some(format!(
            "{name} is due soon on {}",
            renewal.format("%b %-d")
        )),
        RenewalStatus::Upcoming => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn boundaries() {
        let today = day(2026, 10, 14);
        assert_eq!(classify(Some(day(2026, 10, 13)), today), RenewalStatus::Overdue);
        assert_eq!(classify(Some(today), today), RenewalStatus::DueSoon);
        assert_eq!(classify(Some(day(2026, 10, 17)), today), RenewalStatus::DueSoon);
        assert_eq!(classify(Some(day(2026, 10, 18)), today), RenewalStatus::Upcoming);
        assert_eq!(classify(None, today), RenewalStatus::Upcoming);
        assert!(RenewalStatus::DueSoon.is_alert() && RenewalStatus::Overdue.is_alert());
        assert!(!RenewalStatus::Upcoming.is_alert());
    }

    #[test]
    fn crosses_month_and_year_ends() {
        assert_eq!(
            classify(Some(day(2027, 1, 2)), day(2026, 12, 31)),
            RenewalStatus::DueSoon
        );
        assert_eq!(
            classify(Some(day(2026, 2, 28)), day(2026, 3, 1)),
            RenewalStatus::Overdue
        );
    }

    #[test]
    fn messages() {
        let renewal = day(2026, 10, 5);
        assert_eq!(
            alert_message("Netflix", renewal, RenewalStatus::DueSoon).unwrap(),
            "Netflix is due soon on Oct 5"
        );
        assert_eq!(
            alert_message("Netflix", renewal, RenewalStatus::Overdue).unwrap(),
            "Netflix is overdue!"
        );
        assert!(alert_message("Netflix", renewal, RenewalStatus::Upcoming).is_none());
    }

    #[test]
    fn parses_labels() {
        assert_eq!("Due Soon".parse::<RenewalStatus>(), Ok(RenewalStatus::DueSoon));
        assert_eq!("due_soon".parse::<RenewalStatus>(), Ok(RenewalStatus::DueSoon));
        assert_eq!("OVERDUE".parse::<RenewalStatus>(), Ok(RenewalStatus::Overdue));
        assert!("later".parse::<RenewalStatus>().is_err());
    }
}

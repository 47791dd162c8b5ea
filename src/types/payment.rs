use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de;

/// A historical charge from `subscription_payments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(deserialize_with = "de::id")]
    pub subscription_id: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub amount: f64,
    #[serde(default, alias = "created_at")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn between(previous: f64, current: f64) -> Self {
        if current > previous {
            Trend::Up
        } else if current < previous {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Amount of the most recent payment recorded for `subscription_id`.
pub fn previous_amount(payments: &[Payment], subscription_id: &str) -> Option<f64> {
    payments
        .iter()
        .filter(|p| p.subscription_id == subscription_id)
        .max_by_key(|p| p.paid_at)
        .map(|p| p.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn payment(id: &str, sub: &str, amount: f64, day: u32) -> Payment {
        Payment {
            id: id.into(),
            subscription_id: sub.into(),
            amount,
            paid_at: Utc.with_ymd_and_hms(2026, 9, day, 0, 0, 0).single(),
        }
    }

    #[test]
    fn latest_payment_wins() {
        let payments = vec![
            payment("1", "s1", 9.99, 1),
            payment("2", "s1", 11.99, 20),
            payment("3", "s2", 4.0, 25),
        ];
        assert_eq!(previous_amount(&payments, "s1"), Some(11.99));
        assert_eq!(previous_amount(&payments, "s3"), None);
    }

    #[test]
    fn trend_direction() {
        assert_eq!(Trend::between(9.99, 11.99), Trend::Up);
        assert_eq!(Trend::between(11.99, 9.99), Trend::Down);
        assert_eq!(Trend::between(5.0, 5.0), Trend::Flat);
    }
}

pub mod alternative;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod subscription;

pub use alternative::Alternative;
pub use notification::{Notification, NotificationKind, StoredNotification};
pub use payment::Payment;
pub use profile::{Profile, ProfileUpdate};
pub use subscription::{BillingCycle, NewSubscription, Subscription};

/// Lenient readers for hosted-table columns.
///
/// Rows come from PostgREST, from database webhooks and from LLM output, so
/// ids may be integers or uuids, amounts may be numeric strings, and nullable
/// columns show up as `null` rather than missing.
pub(crate) mod de {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_id(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value = Value::deserialize(d)?;
        value_to_id(value.clone())
            .ok_or_else(|| D::Error::custom(format!("expected string or integer id, got {value}")))
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_to_id(Value::deserialize(d)?))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("amount out of range")),
            Value::String(s) => s
                .trim()
                .trim_start_matches('$')
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("invalid amount {s:?}"))),
            other => Err(D::Error::custom(format!("invalid amount {other}"))),
        }
    }

    /// Accepts `YYYY-MM-DD` and full timestamps; only the date part is kept.
    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => {
                let day = s.get(..10).unwrap_or(s);
                NaiveDate::parse_from_str(day, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("invalid date {s:?}")))
            }
        }
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => Ok(vec![s]),
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect()),
            other => Err(D::Error::custom(format!("expected list, got {other}"))),
        }
    }
}

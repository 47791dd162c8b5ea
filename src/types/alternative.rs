use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de;

/// A cheaper service suggested for a category (`subscription_alternatives`).
///
/// The `amount` aliases cover the field names LLMs tend to invent when asked
/// for "estimated monthly amount".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alternative {
    #[serde(default, deserialize_with = "de::opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub category: String,
    #[serde(
        deserialize_with = "de::amount",
        alias = "price",
        alias = "monthly_price",
        alias = "monthlyPrice",
        alias = "estimated_monthly_amount"
    )]
    pub amount: f64,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default, deserialize_with = "de::string_list", alias = "key_features")]
    pub features: Vec<String>,
    #[serde(default, alias = "URL", alias = "link")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alternative {
    pub fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.created_at = Some(now);
        self.updated_at = Some(now);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_llm_shaped_entries() {
        let alt: Alternative = serde_json::from_value(json!({
            "name": "Tubi",
            "provider": "Fox",
            "price": "$0",
            "key_features": ["Free with ads"],
            "URL": "https://tubitv.com"
        }))
        .unwrap();
        assert_eq!(alt.amount, 0.0);
        assert_eq!(alt.features, vec!["Free with ads".to_string()]);
        assert_eq!(alt.url.as_deref(), Some("https://tubitv.com"));
        assert!(alt.category.is_empty());
    }

    #[test]
    fn unstamped_rows_omit_timestamps() {
        let alt: Alternative =
            serde_json::from_value(json!({"name": "A", "amount": 1.5, "features": "one"})).unwrap();
        let value = serde_json::to_value(&alt).unwrap();
        assert!(value.get("created_at").is_none());
        assert_eq!(value["features"], json!(["one"]));
    }
}

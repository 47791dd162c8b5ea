use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::de;

pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// A row of the `subscriptions` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    #[serde(deserialize_with = "de::id")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub category: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub next_renewal_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
    Yearly,
    Other(String),
}

impl From<Option<String>> for BillingCycle {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            None | Some("") => BillingCycle::Monthly,
            Some(s) => match s.to_lowercase().as_str() {
                "weekly" => BillingCycle::Weekly,
                "monthly" => BillingCycle::Monthly,
                "yearly" | "annual" | "annually" => BillingCycle::Yearly,
                _ => BillingCycle::Other(s.to_string()),
            },
        }
    }
}

impl From<BillingCycle> for String {
    fn from(cycle: BillingCycle) -> Self {
        match cycle {
            BillingCycle::Weekly => "Weekly".to_string(),
            BillingCycle::Monthly => "Monthly".to_string(),
            BillingCycle::Yearly => "Yearly".to_string(),
            BillingCycle::Other(s) => s,
        }
    }
}

/// The add/edit form. Every field defaults so that a half-filled form reaches
/// [`NewSubscription::validate`] instead of failing in the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewSubscription {
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub category: String,
    #[serde(default, deserialize_with = "de::amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "de::string")]
    pub currency: String,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub next_renewal_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewSubscription {
    pub fn validate(&self) -> Result<(), String> {
        let blank = [&self.name, &self.category, &self.currency]
            .iter()
            .any(|field| field.trim().is_empty());
        if blank || self.next_renewal_date.is_none() {
            return Err("Please fill all fields".to_string());
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err("Amount must be a positive number".to_string());
        }
        Ok(())
    }

    /// Trims text fields; an empty currency falls back to USD.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.currency = match self.currency.trim() {
            "" => default_currency(),
            c => c.to_string(),
        };
        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }
}

/// Insert/update body sent to PostgREST: the form plus its owner.
#[derive(Debug, Serialize)]
pub struct SubscriptionRow<'a> {
    pub user_id: &'a str,
    #[serde(flatten)]
    pub fields: &'a NewSubscription,
}

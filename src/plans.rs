use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TAX_RATE: f64 = 0.075;
pub const FREE_PLAN_LIMIT: usize = 5;

/// Plan flag stored on `profiles.plan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum PlanTier {
    #[default]
    Free,
    Premium,
}

impl From<Option<String>> for PlanTier {
    fn from(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("premium") => PlanTier::Premium,
            _ => PlanTier::Free,
        }
    }
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Free plan limit reached. You can track up to {limit} subscriptions; upgrade to Premium for more.")]
    PlanLimitReached { limit: usize },
}

pub fn check_subscription_limit(tier: PlanTier, existing: usize) -> Result<(), PlanError> {
    match tier {
        PlanTier::Free if existing >= FREE_PLAN_LIMIT => Err(PlanError::PlanLimitReached {
            limit: FREE_PLAN_LIMIT,
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingPlan {
    pub id: u32,
    pub name: &'static str,
    pub price: f64,
    pub description: &'static str,
}

pub static BILLING_PLANS: [BillingPlan; 2] = [
    BillingPlan {
        id: 1,
        name: "Monthly",
        price: 10.0,
        description: "Perfect for trying out the app",
    },
    BillingPlan {
        id: 2,
        name: "Yearly",
        price: 100.0,
        description: "Best value for long-term use",
    },
];

impl BillingPlan {
    /// Chargeable amounts in cents: the list price, or the price with tax.
    pub fn charge_cents(&self) -> [i64; 2] {
        [to_cents(self.price), to_cents(total(self.price))]
    }

    pub fn accepts_price(&self, price: f64) -> bool {
        price.is_finite() && self.charge_cents().contains(&to_cents(price))
    }

    pub fn accepts_cents(&self, amount: i64) -> bool {
        self.charge_cents().contains(&amount)
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

fn cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn tax(amount: f64) -> f64 {
    cents(amount * TAX_RATE)
}

pub fn total(amount: f64) -> f64 {
    cents(amount + amount * TAX_RATE)
}

/// A plan as the checkout summary shows it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQuote {
    #[serde(flatten)]
    pub plan: BillingPlan,
    pub tax: f64,
    pub total: f64,
}

pub fn quotes() -> Vec<PlanQuote> {
    BILLING_PLANS
        .iter()
        .cloned()
        .map(|plan| PlanQuote {
            tax: tax(plan.price),
            total: total(plan.price),
            plan,
        })
        .collect()
}

pub fn find_plan(name: &str) -> Option<&'static BillingPlan> {
    BILLING_PLANS
        .iter()
        .find(|plan| plan.name.eq_ignore_ascii_case(name.trim()))
}

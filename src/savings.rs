//! Savings recommendations: cheaper alternatives per subscription and the
//! totals the savings page charts.

use serde::{Deserialize, Serialize};

use crate::types::{Alternative, Subscription};

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub alternative: Alternative,
    pub monthly_savings: f64,
    pub yearly_savings: f64,
    pub recommended: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub subscription: Subscription,
    /// Cheapest first; the first entry is the recommended one.
    pub alternatives: Vec<Candidate>,
}

impl Recommendation {
    pub fn best_monthly_savings(&self) -> f64 {
        self.alternatives
            .first()
            .map_or(0.0, |c| c.monthly_savings)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySavings {
    pub category: String,
    pub savings: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthSavings {
    pub month: &'static str,
    pub savings: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsReport {
    pub total_yearly_savings: f64,
    pub by_category: Vec<CategorySavings>,
    pub monthly_projection: Vec<MonthSavings>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsSort {
    #[default]
    Savings,
    Name,
    Category,
}

/// Same category, strictly cheaper, sorted by amount.
pub fn candidates_for(sub: &Subscription, alternatives: &[Alternative]) -> Vec<Candidate> {
    let mut cheaper: Vec<&Alternative> = alternatives
        .iter()
        .filter(|alt| alt.category == sub.category && alt.amount < sub.amount)
        .collect();
    cheaper.sort_by(|a, b| a.amount.total_cmp(&b.amount));
    cheaper
        .into_iter()
        .enumerate()
        .map(|(idx, alt)| {
            let monthly_savings = sub.amount - alt.amount;
            Candidate {
                alternative: alt.clone(),
                monthly_savings,
                yearly_savings: monthly_savings * 12.0,
                recommended: idx == 0,
            }
        })
        .collect()
}

/// Only each subscription's recommended alternative feeds the totals, the
/// per-category bars and the 12-month projection.
pub fn build_report(
    subs: &[Subscription],
    alternatives: &[Alternative],
    sort: SavingsSort,
) -> SavingsReport {
    let mut total_yearly_savings = 0.0;
    let mut by_category: Vec<CategorySavings> = Vec::new();
    let mut monthly = [0.0_f64; 12];

    let mut recommendations: Vec<Recommendation> = subs
        .iter()
        .map(|sub| Recommendation {
            subscription: sub.clone(),
            alternatives: candidates_for(sub, alternatives),
        })
        .collect();

    for rec in &recommendations {
        let Some(best) = rec.alternatives.first() else {
            continue;
        };
        total_yearly_savings += best.yearly_savings;
        match by_category
            .iter_mut()
            .find(|c| c.category == rec.subscription.category)
        {
            Some(entry) => entry.savings += best.yearly_savings,
            None => by_category.push(CategorySavings {
                category: rec.subscription.category.clone(),
                savings: best.yearly_savings,
            }),
        }
        monthly.iter_mut().for_each(|m| *m += best.monthly_savings);
    }

    sort_recommendations(&mut recommendations, sort);

    SavingsReport {
        total_yearly_savings,
        by_category,
        monthly_projection: MONTHS
            .iter()
            .zip(monthly)
            .map(|(month, savings)| MonthSavings {
                month: *month,
                savings,
            })
            .collect(),
        recommendations,
    }
}

pub fn sort_recommendations(recs: &mut [Recommendation], sort: SavingsSort) {
    match sort {
        SavingsSort::Name => recs.sort_by(|a, b| {
            a.subscription
                .name
                .to_lowercase()
                .cmp(&b.subscription.name.to_lowercase())
        }),
        SavingsSort::Category => recs.sort_by(|a, b| {
            a.subscription
                .category
                .to_lowercase()
                .cmp(&b.subscription.category.to_lowercase())
        }),
        SavingsSort::Savings => {
            recs.sort_by(|a, b| b.best_monthly_savings().total_cmp(&a.best_monthly_savings()))
        }
    }
}

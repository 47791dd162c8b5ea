//! Category detection and cheaper-alternative generation for the
//! `subtrack-alternatives` job.
//!
//! Both steps ask the LLM and degrade instead of failing: an unusable
//! category answer becomes `Other`, and an unusable alternatives answer is
//! replaced by three deterministic mock tiers priced just under the
//! subscription.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;

use crate::llm::{LlmClient, LlmError};
use crate::types::{Alternative, Subscription};

pub const CATEGORIES: [&str; 9] = [
    "Streaming",
    "Music",
    "Cloud Storage",
    "Productivity",
    "Gaming",
    "News",
    "Utilities",
    "Fitness",
    "Other",
];

pub const OTHER: &str = "Other";

pub const CATEGORY_TEMPERATURE: f32 = 0.0;
pub const ALTERNATIVES_TEMPERATURE: f32 = 0.7;

pub fn category_prompt(subscription_name: &str) -> String {
    let choices = CATEGORIES
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Identify the most likely subscription category for \"{subscription_name}\".\n\
         Choose one of: [{choices}].\n\
         Return only the category name."
    )
}

/// Maps a free-text answer onto [`CATEGORIES`], falling back to `Other`.
pub fn parse_category(answer: &str) -> String {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .trim();
    CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(cleaned))
        .copied()
        .unwrap_or(OTHER)
        .to_string()
}

/// A stored category wins over detection unless it is blank or `Other`.
pub fn known_category(sub: &Subscription) -> Option<&str> {
    let existing = sub.category.trim();
    if existing.is_empty() || existing.eq_ignore_ascii_case(OTHER) {
        None
    } else {
        Some(existing)
    }
}

pub fn alternatives_prompt(sub: &Subscription, category: &str) -> String {
    format!(
        "Suggest 3 cheaper subscription alternatives to \"{}\" in the \"{}\" category, \
         each costing less than {:.2} per month.\n\
         Return only a JSON array of objects with the keys \"name\", \"provider\", \
         \"amount\" (estimated monthly price as a number), \"features\" (array of strings) and \"url\".",
        sub.name, category, sub.amount
    )
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Reads the LLM's JSON answer. Entries that don't decode, or that are not
/// cheaper than `base_amount`, are dropped; the rest inherit `category`
/// when they don't name one.
pub fn parse_alternatives(
    text: &str,
    category: &str,
    base_amount: f64,
) -> Result<Vec<Alternative>, LlmError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("alternatives") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let alternatives = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Alternative>(item) {
            Ok(alt) => Some(alt),
            Err(e) => {
                debug!("skipping alternative entry: {}", e);
                None
            }
        })
        .filter(|alt| !alt.name.trim().is_empty() && alt.amount < base_amount)
        .map(|mut alt| {
            alt.name = alt.name.trim().to_string();
            if alt.category.trim().is_empty() {
                alt.category = category.to_string();
            }
            alt
        });
    Ok(cheapest_per_name(alternatives))
}

/// One row per name, since the upsert conflicts on `name`. A repeated name
/// keeps its first position and its cheapest amount.
fn cheapest_per_name(alternatives: impl IntoIterator<Item = Alternative>) -> Vec<Alternative> {
    let mut unique: Vec<Alternative> = Vec::new();
    for alt in alternatives {
        match unique.iter_mut().find(|kept| kept.name == alt.name) {
            Some(kept) if alt.amount < kept.amount => *kept = alt,
            Some(_) => debug!("dropping repeated alternative {}", alt.name),
            None => unique.push(alt),
        }
    }
    unique
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Lite, Basic and Essential tiers at 2, 1.5 and 1 below the subscription.
/// Tiers that would cost nothing or less are left out.
pub fn mock_alternatives(sub: &Subscription, category: &str) -> Vec<Alternative> {
    let tiers: [(&str, f64, [&str; 2]); 3] = [
        ("Lite", 2.0, ["Basic feature 1", "Basic feature 2"]),
        ("Basic", 1.5, ["Feature A", "Feature B"]),
        ("Essential", 1.0, ["Feature X", "Feature Y"]),
    ];
    let slug = slug(&sub.name);
    tiers
        .iter()
        .map(|(tier, discount, features)| Alternative {
            id: None,
            name: format!("{} {}", sub.name, tier),
            category: category.to_string(),
            amount: sub.amount - discount,
            provider: Some(format!("{} Provider", sub.name)),
            features: features.iter().map(|f| f.to_string()).collect(),
            url: Some(format!("https://example.com/{}-{}", slug, tier.to_lowercase())),
            created_at: None,
            updated_at: None,
        })
        .filter(|alt| alt.amount > 0.0)
        .collect()
}

pub async fn detect_category(llm: &LlmClient, sub: &Subscription) -> String {
    if let Some(existing) = known_category(sub) {
        return existing.to_string();
    }
    match llm
        .complete(&category_prompt(&sub.name), CATEGORY_TEMPERATURE)
        .await
    {
        Ok(answer) => parse_category(&answer),
        Err(e) => {
            warn!("Error detecting category for {}: {}", sub.name, e);
            OTHER.to_string()
        }
    }
}

async fn generate(
    llm: &LlmClient,
    sub: &Subscription,
    category: &str,
) -> Result<Vec<Alternative>, LlmError> {
    let answer = llm
        .complete(&alternatives_prompt(sub, category), ALTERNATIVES_TEMPERATURE)
        .await?;
    let alternatives = parse_alternatives(&answer, category, sub.amount)?;
    if alternatives.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(alternatives)
}

/// LLM suggestions for `sub`, or the mock tiers when that fails. Every row is
/// stamped with `now`.
pub async fn suggest(
    llm: &LlmClient,
    sub: &Subscription,
    category: &str,
    now: DateTime<Utc>,
) -> Vec<Alternative> {
    let alternatives = match generate(llm, sub, category).await {
        Ok(alternatives) => alternatives,
        Err(e) => {
            warn!("{}. Using mock alternatives for {}", e, sub.name);
            mock_alternatives(sub, category)
        }
    };
    alternatives.into_iter().map(|alt| alt.stamped(now)).collect()
}

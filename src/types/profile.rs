use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de;
use crate::plans::PlanTier;

/// A row of `profiles`; `id` is the auth user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default, deserialize_with = "de::opt_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub plan: PlanTier,
}

impl Profile {
    /// Stand-in used until the user saves a profile row.
    pub fn fallback(user_id: &str, email: Option<&str>) -> Self {
        let username = email
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string);
        Self {
            id: Some(user_id.to_string()),
            username,
            avatar_url: None,
            plan: PlanTier::Free,
        }
    }

    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("User")
    }
}

/// Profile edit form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileRow<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

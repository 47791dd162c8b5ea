//! Minimal Supabase client: Auth user lookup plus the PostgREST calls the
//! relay and the alternatives job make.
//!
//! Requests carry the project key in `apikey`. `Authorization` holds either
//! the same key (service calls) or a user's access token (see
//! [`SupabaseClient::as_user`]), so row-level security applies to relay
//! requests made on behalf of a signed-in user.

use chrono::Utc;
use log::{debug, trace};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::SupabaseConfig;
use crate::plans::PlanTier;
use crate::types::profile::ProfileRow;
use crate::types::subscription::SubscriptionRow;
use crate::types::{
    Alternative, NewSubscription, Payment, Profile, ProfileUpdate, StoredNotification,
    Subscription,
};

/// PostgREST code for "no row" when a single object was requested.
pub const NO_ROWS: &str = "PGRST116";

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Supabase request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Supabase error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid or expired session")]
    Unauthorized,
}

impl SupabaseError {
    pub fn code(&self) -> Option<&str> {
        match self {
            SupabaseError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    #[serde(alias = "error_description", alias = "msg")]
    error: Option<String>,
}

/// The `auth/v1/user` response, trimmed to what the relay uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupabaseUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::types::de::id")]
    id: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    bearer: String,
    http: reqwest::Client,
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self::with_credentials(&config.url, &config.key)
    }

    pub fn with_credentials(url: &str, key: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            api_key: key.to_string(),
            bearer: key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Same project, but requests are authorised as the token's user.
    pub fn as_user(&self, access_token: &str) -> Self {
        Self {
            bearer: access_token.to_string(),
            ..self.clone()
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        trace!("supabase {} {}", method, url);
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, SupabaseError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(SupabaseError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<PostgrestError>(&body).ok();
        let code = parsed.as_ref().and_then(|e| e.code.clone());
        let message = parsed
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(body);
        debug!("supabase error {} {:?}: {}", status, code, message);
        Err(SupabaseError::Api {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Vec<T>, SupabaseError> {
        Ok(self.send(builder).await?.json::<Vec<T>>().await?)
    }

    pub async fn get_user(&self, access_token: &str) -> Result<SupabaseUser, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let builder = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token);
        match self.send(builder).await {
            Ok(response) => Ok(response.json::<SupabaseUser>().await?),
            Err(SupabaseError::Api { status: 403, .. }) => Err(SupabaseError::Unauthorized),
            Err(e) => Err(e),
        }
    }

    pub async fn list_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<Subscription>, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("subscriptions"))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("order", "next_renewal_date.asc".to_string()),
            ]);
        self.rows(builder).await
    }

    /// Every subscription in the project; needs the service key.
    pub async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("subscriptions"))
            .query(&[("select", "*")]);
        self.rows(builder).await
    }

    pub async fn count_subscriptions(&self, user_id: &str) -> Result<usize, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("subscriptions"))
            .query(&[("select", "id".to_string()), ("user_id", eq(user_id))]);
        Ok(self.rows::<IdOnly>(builder).await?.len())
    }

    pub async fn insert_subscription(
        &self,
        user_id: &str,
        fields: &NewSubscription,
    ) -> Result<Option<Subscription>, SupabaseError> {
        let builder = self
            .request(Method::POST, self.rest_url("subscriptions"))
            .header("Prefer", "return=representation")
            .json(&[SubscriptionRow { user_id, fields }]);
        Ok(self.rows(builder).await?.into_iter().next())
    }

    /// `None` when no row with that id belongs to the user.
    pub async fn update_subscription(
        &self,
        id: &str,
        user_id: &str,
        fields: &NewSubscription,
    ) -> Result<Option<Subscription>, SupabaseError> {
        let builder = self
            .request(Method::PATCH, self.rest_url("subscriptions"))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation")
            .json(&SubscriptionRow { user_id, fields });
        Ok(self.rows(builder).await?.into_iter().next())
    }

    pub async fn delete_subscription(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<bool, SupabaseError> {
        let builder = self
            .request(Method::DELETE, self.rest_url("subscriptions"))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation");
        Ok(!self.rows::<IdOnly>(builder).await?.is_empty())
    }

    pub async fn list_payments(&self, user_id: &str) -> Result<Vec<Payment>, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("subscription_payments"))
            .query(&[
                (
                    "select",
                    "id,subscription_id,amount,paid_at,subscriptions!inner(user_id)".to_string(),
                ),
                ("subscriptions.user_id", eq(user_id)),
            ]);
        self.rows(builder).await
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("profiles"))
            .query(&[("select", "id,username,avatar_url,plan".to_string()), ("id", eq(user_id))])
            .header("Accept", "application/vnd.pgrst.object+json");
        match self.send(builder).await {
            Ok(response) => Ok(Some(response.json::<Profile>().await?)),
            Err(e) if e.code() == Some(NO_ROWS) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes the plan flag, creating the profile row if the user never saved one.
    pub async fn update_plan(&self, user_id: &str, tier: PlanTier) -> Result<(), SupabaseError> {
        let builder = self
            .request(Method::POST, self.rest_url("profiles"))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&json!({ "id": user_id, "plan": tier, "updated_at": Utc::now() }));
        self.send(builder).await.map(|_| ())
    }

    pub async fn upsert_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, SupabaseError> {
        let row = ProfileRow {
            id: user_id,
            username: update.username.as_deref(),
            avatar_url: update.avatar_url.as_deref(),
            updated_at: Utc::now(),
        };
        let builder = self
            .request(Method::POST, self.rest_url("profiles"))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);
        Ok(self.rows(builder).await?.into_iter().next())
    }

    pub async fn list_alternatives(
        &self,
        category: &str,
        below: Option<f64>,
    ) -> Result<Vec<Alternative>, SupabaseError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("category", eq(category)),
            ("order", "amount.asc".to_string()),
        ];
        if let Some(limit) = below {
            query.push(("amount", format!("lt.{limit}")));
        }
        let builder = self
            .request(Method::GET, self.rest_url("subscription_alternatives"))
            .query(&query);
        self.rows(builder).await
    }

    pub async fn upsert_alternatives(&self, rows: &[Alternative]) -> Result<(), SupabaseError> {
        if rows.is_empty() {
            return Ok(());
        }
        let builder = self
            .request(Method::POST, self.rest_url("subscription_alternatives"))
            .query(&[("on_conflict", "name")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        self.send(builder).await.map(|_| ())
    }

    pub async fn list_notifications(
        &self,
        user_id: &str,
    ) -> Result<Vec<StoredNotification>, SupabaseError> {
        let builder = self
            .request(Method::GET, self.rest_url("notifications"))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ]);
        self.rows(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_user_keeps_project_key() {
        let service = SupabaseClient::with_credentials("https://demo.supabase.co/", "anon-key");
        let user = service.as_user("jwt-token");
        assert_eq!(user.api_key, "anon-key");
        assert_eq!(user.bearer, "jwt-token");
        assert_eq!(service.bearer, "anon-key");
        assert_eq!(
            user.rest_url("subscriptions"),
            "https://demo.supabase.co/rest/v1/subscriptions"
        );
    }

    #[test]
    fn postgrest_error_body_is_read() {
        let parsed: PostgrestError = serde_json::from_str(
            r#"{"code":"PGRST116","details":"0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#,
        )
        .unwrap();
        assert_eq!(parsed.code.as_deref(), Some(NO_ROWS));
        assert!(parsed.message.unwrap().starts_with("JSON object requested"));
    }

    #[test]
    fn api_error_exposes_code() {
        let err = SupabaseError::Api {
            status: 406,
            code: Some(NO_ROWS.into()),
            message: "none".into(),
        };
        assert_eq!(err.code(), Some(NO_ROWS));
        assert_eq!(SupabaseError::Unauthorized.code(), None);
    }
}

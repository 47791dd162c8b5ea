use log::{info, warn};

use crate::env::{load_env_var, optional_env_var, parse_env_var, require_env_var};
use crate::error::ConfigError;

pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";
pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the single-page client; checkout redirects land here.
    pub client_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: load_env_var("HOST", "127.0.0.1"),
            port: parse_env_var("PORT", "3001")?,
            client_url: load_env_var("CLIENT_URL", DEFAULT_CLIENT_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: Option<String>,
    pub api_base: String,
}

impl StripeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = require_env_var(&["STRIPE_SECRET_KEY"])?;
        if !secret_key.starts_with("sk_") && !secret_key.starts_with("rk_") {
            warn!("STRIPE_SECRET_KEY does not look like a Stripe secret key");
        }
        let webhook_secret = optional_env_var(&["STRIPE_WEBHOOK_SECRET"]);
        if webhook_secret.is_none() {
            info!("STRIPE_WEBHOOK_SECRET not set, /webhooks/stripe will reject every event");
        }
        Ok(Self {
            secret_key,
            webhook_secret,
            api_base: load_env_var("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    /// Shared secret expected in `x-webhook-secret` on database webhooks.
    pub webhook_secret: Option<String>,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: require_env_var(&["SUPABASE_URL", "VITE_SUPABASE_URL"])?,
            key: require_env_var(&["SUPABASE_KEY", "VITE_SUPABASE_ANON_KEY"])?,
            webhook_secret: optional_env_var(&["SUPABASE_WEBHOOK_SECRET"]),
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: require_env_var(&["OPENAI_API_KEY"])?,
            model: load_env_var("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            base_url: load_env_var("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
        })
    }
}

use dotenvy::dotenv;
use log::{error, info};
use std::{env as stdenv, path::Path};

use crate::error::ConfigError;

pub fn load_env_file() {
    let current_dir = stdenv::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let env_path = current_dir.join(".env");

    if dotenv().is_err() {
        error!(
            ".env file not found. Expected it at: {}",
            env_path.display()
        );
    } else {
        info!(".env loading at: {}", env_path.display());
    }
}

pub fn load_env_var(key: &str, default: &str) -> String {
    stdenv::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// First non-empty value among `keys`, so `SUPABASE_URL` can fall back to the
/// `VITE_` name the frontend build uses.
pub fn optional_env_var(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| stdenv::var(key).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

pub fn require_env_var(keys: &[&str]) -> Result<String, ConfigError> {
    optional_env_var(keys).ok_or_else(|| ConfigError::Missing(keys.join(" or ")))
}

pub fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    let value = load_env_var(key, default);
    value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value,
    })
}

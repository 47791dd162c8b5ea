pub mod alternatives;
pub mod auth;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod env;
pub mod error;
pub mod llm;
pub mod logger;
pub mod notifications;
pub mod plans;
pub mod realtime;
pub mod relay;
pub mod renewal;
pub mod savings;
pub mod stripe;
pub mod supabase;
pub mod types;

pub use client::StripeClient;
pub use error::{AppError, ConfigError};
pub use supabase::SupabaseClient;

pub const VERSION: &str = env!("SUBTRACK_PKG_VERSION");
pub const DESCRIPTION: &str = env!("SUBTRACK_PKG_DESCRIPTION");
pub const NAME: &str = env!("SUBTRACK_PKG_NAME");

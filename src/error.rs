//! Error types shared by the relay handlers.
//!
//! Each external boundary has its own error enum ([`SupabaseError`],
//! [`StripeError`], [`LlmError`]); [`AppError`] wraps them and decides the
//! HTTP status a handler answers with.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::plans::PlanError;
use crate::stripe::StripeError;
use crate::supabase::SupabaseError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set in environment or .env")]
    Missing(String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    PaymentRequired(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error(transparent)]
    Stripe(#[from] StripeError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Plan(_) => StatusCode::FORBIDDEN,
            AppError::Stripe(StripeError::Signature(_) | StripeError::InvalidRequest(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Supabase(SupabaseError::Unauthorized) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_)
            | AppError::Supabase(_)
            | AppError::Stripe(_)
            | AppError::Llm(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

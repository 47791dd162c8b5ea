//! `Authorization: Bearer <supabase access token>` gate for `/api` routes.

use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use log::debug;

use crate::error::AppError;
use crate::relay::AppState;
use crate::supabase::{SupabaseClient, SupabaseError};
use crate::types::Profile;

/// The signed-in user behind a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    access_token: String,
}

impl AuthUser {
    /// A Supabase client acting as this user, so row-level security applies.
    pub fn supabase(&self, state: &AppState) -> SupabaseClient {
        state.supabase.as_user(&self.access_token)
    }

    pub fn fallback_profile(&self) -> Profile {
        Profile::fallback(&self.id, self.email.as_deref())
    }
}

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token.to_string())
    } else {
        None
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();
        Box::pin(async move {
            let token = token.ok_or(AppError::Unauthorized)?;
            let state = state
                .ok_or_else(|| AppError::Internal("relay state not configured".into()))?;
            let user = state.supabase.get_user(&token).await.map_err(|e| match e {
                SupabaseError::Unauthorized => AppError::Unauthorized,
                other => AppError::from(other),
            })?;
            debug!("authenticated {}", user.id);
            Ok(AuthUser {
                id: user.id,
                email: user.email,
                access_token: token,
            })
        })
    }
}

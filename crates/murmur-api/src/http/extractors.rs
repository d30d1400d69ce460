//! Request extractors.
//!
//! Caller identity arrives in the `X-User-Id` header, set by the auth
//! layer in front of this service. A missing or malformed header is a
//! client error; there is no anonymous access to user-scoped routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::http::error::AppError;

/// The authenticated caller's id, taken from `X-User-Id`.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| AppError::Validation("missing X-User-Id header".to_string()))?;

        let value = header
            .to_str()
            .map_err(|_| AppError::Validation("invalid X-User-Id header".to_string()))?;

        let user_id = value
            .parse::<Uuid>()
            .map_err(|_| AppError::Validation("X-User-Id must be a UUID".to_string()))?;

        Ok(UserId(user_id))
    }
}

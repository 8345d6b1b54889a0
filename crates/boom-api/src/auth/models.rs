use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use boom_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MISSING_TOKEN_MESSAGE: &str = "No authentication token, access denied";
pub const INVALID_TOKEN_MESSAGE: &str = "Token is not valid";

/// Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Authenticated caller, inserted into request extensions by the auth middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: Uuid,
}

// Extracted from request parts so it composes with Multipart, which must come last.
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .copied()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string())))
    }
}

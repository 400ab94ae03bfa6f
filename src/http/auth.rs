use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::StorefrontError;

/// Header carrying the caller's identity, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| AuthUser(v.to_string()))
            .ok_or(StorefrontError::Unauthenticated)
    }
}

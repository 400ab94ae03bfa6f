use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::StorefrontError;

impl StorefrontError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<JsonRejection> for StorefrontError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Storage(detail) = &self {
            tracing::error!(error = %detail, "storage failure");
        }
        let body = Json(json!({"error": {"kind": self.kind(), "message": self.to_string()}}));
        let mut resp = (status, body).into_response();
        // Both are transient: a retry with a fresh order number or a
        // recovered database can succeed.
        if matches!(status, StatusCode::CONFLICT | StatusCode::SERVICE_UNAVAILABLE) {
            resp.headers_mut().insert("retry-after", HeaderValue::from_static("1"));
        }
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_status_mapping() {
        assert_eq!(StorefrontError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(StorefrontError::NotFound("Cart item").status(), StatusCode::NOT_FOUND);
        let resp = StorefrontError::Conflict("dup".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(resp.headers()["retry-after"], "1");
    }
}

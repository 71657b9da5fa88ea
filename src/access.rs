//! Shared-secret access gate
//!
//! When `ACCESS_SECRET` is configured, API requests must present it in the
//! `X-Access-Secret` header or as `Authorization: Bearer <secret>`.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

pub const ACCESS_SECRET_HEADER: &str = "x-access-secret";

/// Constant-time secret comparison
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reject requests without the configured secret
pub async fn require_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().access.secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let authorized = request
        .headers()
        .get(ACCESS_SECRET_HEADER)
        .or_else(|| request.headers().get(AUTHORIZATION))
        .and_then(|v| v.to_str().ok())
        .map(|s| secrets_match(s.strip_prefix("Bearer ").unwrap_or(s), expected));

    match authorized {
        Some(true) => Ok(next.run(request).await),
        Some(false) => {
            tracing::warn!(uri = %request.uri(), "Rejected request with wrong access secret");
            Err(AppError::Unauthorized("Invalid access secret".to_string()))
        }
        None => Err(AppError::Unauthorized(
            "Access secret required. Provide it in 'X-Access-Secret' or 'Authorization: Bearer <secret>' header"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("hunter2", "hunter2"));
        assert!(!secrets_match("hunter3", "hunter2"));
        assert!(!secrets_match("hunter", "hunter2"));
        assert!(!secrets_match("", "hunter2"));
    }
}

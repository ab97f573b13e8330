//! Caller identity
//!
//! Tokens are verified by the gateway in front of this service, which
//! forwards the authenticated user id in the `X-User-Id` header.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::response::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user a request acts for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Reject requests without a user id; otherwise expose it as an extension.
pub async fn require_user(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?
        .to_string();

    request.extensions_mut().insert(UserId(user));
    Ok(next.run(request).await)
}

/// Aggregate version the client last saw, from `If-Match` (`3` or `"3"`)
pub fn if_match_version(headers: &HeaderMap) -> Result<u64, ApiError> {
    let value = headers
        .get(header::IF_MATCH)
        .ok_or_else(|| ApiError::precondition_required("Missing If-Match header"))?;

    value
        .to_str()
        .ok()
        .map(|v| v.trim().trim_start_matches("W/").trim_matches('"'))
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ApiError::bad_request("If-Match must contain the aggregate version"))
}

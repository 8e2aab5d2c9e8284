use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::error::{ApiError, ErrorCode};

use crate::AppState;

/// Username accepted for HTTP Basic credentials; the password carries the token.
const BASIC_USERNAME: &str = "notebook";

pub const TOKEN_HEADER: &str = "x-auth-token";

/// Token gate composed ahead of the content routes. When no token is
/// configured the gate is open; otherwise the request must carry the token
/// as a Bearer credential, a Basic password, or the custom header.
pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let Some(expected) = state.settings.auth_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    match token_from_headers(request.headers()) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err((
            StatusCode::FORBIDDEN,
            Json(ApiError::new(
                ErrorCode::Unauthorized,
                "authentication required",
            )),
        )),
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Some(token) = authorization.and_then(|value| value.strip_prefix("Bearer ")) {
        return Some(token.to_string());
    }

    if let Some(encoded) = authorization.and_then(|value| value.strip_prefix("Basic ")) {
        if let Some(token) = basic_password(encoded) {
            return Some(token);
        }
    }

    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn basic_password(encoded: &str) -> Option<String> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (username, password) = credentials.split_once(':')?;
    (username == BASIC_USERNAME).then(|| password.to_string())
}

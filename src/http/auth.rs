//! Principal resolution for every API request.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::AppState;

pub const AUTH_HEADER: &str = "x-auth-token";

pub(crate) fn auth_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves `x-auth-token` into a `Principal` request extension.
///
/// No header means an anonymous principal; an unknown or expired token is
/// rejected with 401.
pub async fn principal_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = state.identity.resolve(auth_token(request.headers())).await;

    match resolved {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

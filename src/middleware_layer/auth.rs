use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    services::session::{AuthState, SessionContext},
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth_token";

/// Extracts the session token from the `Authorization` header or the auth cookie.
///
/// # Arguments
///
/// * `request` - The incoming request.
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the token if found.
fn extract_token(request: &Request<Body>, cookies: &Cookies) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| cookies.get(AUTH_COOKIE).map(|c| c.value().to_string()))
}

/// A middleware that requires a valid session to be present.
///
/// Decode failures are never surfaced: the caller is simply not authenticated.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an `AppError`.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking authentication...");

    let token = extract_token(&request, &cookies);

    match state.sessions.check(token.as_deref()).await? {
        AuthState::Authenticated(claims) => {
            tracing::debug!("✅ User authenticated: {}", claims.user_id);
            let context = SessionContext {
                claims,
                token: token.unwrap_or_default(),
            };
            request.extensions_mut().insert(context);
            Ok(next.run(request).await)
        }
        AuthState::Unauthenticated(reason) => {
            tracing::debug!("❌ Unauthenticated request: {:?}", reason);
            Err(AppError::Unauthenticated)
        }
    }
}

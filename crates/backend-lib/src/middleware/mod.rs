// ============================
// crates/backend-lib/src/middleware/mod.rs
// ============================
//! Request-interception gates for the two authentication surfaces.
//!
//! The admin gate guards the cookie-session surface: it runs exactly
//! once per request, before any protected handler, and either forwards
//! the request with the resolved principal attached or ends it with a
//! redirect (Denied) or 403 (Forbidden). The API gate guards bearer
//! routes with the stateless claims token.

use crate::error::AppError;
use crate::metrics as keys;
use crate::storage::UserStore;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use metrics::counter;
use std::sync::Arc;

/// Gate for the protected admin prefix (stateful cookie surface).
///
/// State machine per request:
/// - exempt sub-path or foreign prefix: pass through untouched
/// - no cookie: redirect to the login page
/// - cookie does not resolve, session expired, or the store is
///   unreachable: redirect and clear the cookie (identical handling;
///   the client cannot tell the cases apart)
/// - resolves but role does not satisfy the requirement: 403, cookie
///   kept (the credential may be valid elsewhere)
/// - resolves with the required role: request proceeds
pub async fn admin_gate<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let gate = &state.settings.gate;
    let path = request.uri().path().to_string();

    if !path.starts_with(&gate.protected_prefix)
        || gate.exempt_paths.iter().any(|exempt| *exempt == path)
    {
        return next.run(request).await;
    }

    let Some(token) = cookie_value(request.headers(), &gate.cookie_name) else {
        counter!(keys::GATE_DENIED).increment(1);
        return deny_redirect(&gate.login_path, None);
    };

    match state.session_auth.authenticate(&token).await {
        Ok(ctx) => {
            if ctx.role != gate.required_role {
                // Forbidden is distinct from Denied: the credential is
                // valid, so it is not destroyed
                counter!(keys::GATE_FORBIDDEN).increment(1);
                return AppError::InsufficientRole.into_response();
            }
            request.extensions_mut().insert(ctx);
            next.run(request).await
        },
        Err(err) => {
            // Invalid, expired, or the store was unreachable: fail
            // closed. The stale cookie is cleared in every case.
            if matches!(err, AppError::StorageUnavailable) {
                tracing::warn!(path = %path, "session store unavailable, denying request");
            }
            counter!(keys::GATE_DENIED).increment(1);
            deny_redirect(
                &gate.login_path,
                Some(clear_session_cookie(&gate.cookie_name)),
            )
        },
    }
}

/// Gate for bearer API routes (stateless claims surface).
///
/// Pure in-memory check; a missing credential is rejected the same way
/// as an unverifiable one.
pub async fn api_auth<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return AppError::TokenMalformed.into_response();
    };

    match state.claims_auth.authenticate(&token).await {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        },
        Err(err) => err.into_response(),
    }
}

/// Extract a cookie value from the Cookie header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Extract the token from a `Authorization: Bearer` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Build the session cookie set on login
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// Build the clearing cookie sent on logout and on denial
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn deny_redirect(login_path: &str, clear_cookie: Option<String>) -> Response {
    match clear_cookie {
        Some(cookie) => (
            AppendHeaders([(header::SET_COOKIE, cookie)]),
            Redirect::to(login_path),
        )
            .into_response(),
        None => Redirect::to(login_path).into_response(),
    }
}

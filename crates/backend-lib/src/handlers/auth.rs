// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Authentication endpoint handlers.
use crate::auth::{hash_password_secure, validate_password_strength, AuthContext};
use crate::error::AppError;
use crate::metrics as keys;
use crate::middleware::{clear_session_cookie, cookie_value, session_cookie};
use crate::storage::UserStore;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Response},
    Extension, Json,
};
use docsmith_common::{
    AckResponse, ApiTokenResponse, LoginRequest, MeResponse, PrincipalSummary, RegisterRequest,
    Role, SetPasswordRequest, UserRecord,
};
use metrics::counter;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

/// Minimal login page; the real UI is rendered by the web client, this
/// only has to exist as the redirect target of the gate.
const LOGIN_PAGE: &str = "<!doctype html>\
<html><head><title>Docsmith admin login</title></head>\
<body><form method=\"post\" action=\"/admin/login\">\
<input name=\"identifier\" type=\"email\" placeholder=\"email\">\
<input name=\"secret\" type=\"password\" placeholder=\"password\">\
<button type=\"submit\">Sign in</button>\
</form></body></html>";

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

/** Cookie-surface login.

On success sets the HTTP-only session cookie and returns the principal
summary. Failure statuses are distinct per kind: missing fields 400,
unknown principal or bad secret 401, wrong role 403. */
pub async fn login<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let ip = client_ip(&headers);
    if state.login_limiter.is_locked(ip) {
        return Err(AppError::AuthRateLimited);
    }

    let required_role = state.settings.gate.required_role;
    let user = match state
        .verifier
        .verify(&req.identifier, &req.secret, Some(required_role))
        .await
    {
        Ok(user) => {
            state.login_limiter.record_success(ip);
            user
        },
        Err(err) => {
            if matches!(err, AppError::UnknownPrincipal | AppError::InvalidSecret) {
                state.login_limiter.record_failure(ip);
            }
            counter!(keys::LOGIN_FAILURE).increment(1);
            return Err(err);
        },
    };

    let session = state.sessions.create(user.id).await;
    counter!(keys::LOGIN_SUCCESS).increment(1);
    info!(email = %user.email, "admin login");

    let cookie = session_cookie(
        &state.settings.gate.cookie_name,
        &session.token,
        state.settings.auth.session_ttl_secs,
    );
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(PrincipalSummary::from(&user)),
    )
        .into_response())
}

/** Cookie-surface logout.

Unconditionally idempotent: invalidating the session is best-effort,
the cookie is always cleared, and the response is always success. */
pub async fn logout<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    if let Some(token) = cookie_value(&headers, &state.settings.gate.cookie_name) {
        state.sessions.invalidate(&token).await;
    }

    (
        AppendHeaders([(
            header::SET_COOKIE,
            clear_session_cookie(&state.settings.gate.cookie_name),
        )]),
        Json(AckResponse { success: true }),
    )
        .into_response()
}

/// API-surface login: issues a stateless claims token for any role.
/// Logout cannot revoke these; they expire by their own clock.
pub async fn api_login<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiTokenResponse>, AppError> {
    let ip = client_ip(&headers);
    if state.login_limiter.is_locked(ip) {
        return Err(AppError::AuthRateLimited);
    }

    let user = match state.verifier.verify(&req.identifier, &req.secret, None).await {
        Ok(user) => {
            state.login_limiter.record_success(ip);
            user
        },
        Err(err) => {
            if matches!(err, AppError::UnknownPrincipal | AppError::InvalidSecret) {
                state.login_limiter.record_failure(ip);
            }
            counter!(keys::LOGIN_FAILURE).increment(1);
            return Err(err);
        },
    };

    let (token, expires_at) = state.claims.encode(&user)?;
    counter!(keys::LOGIN_SUCCESS).increment(1);
    info!(email = %user.email, "api token issued");

    Ok(Json(ApiTokenResponse { token, expires_at }))
}

/// Self-service registration; new principals are always CLIENT.
pub async fn register<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PrincipalSummary>), AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::MissingCredentials);
    }

    let requirements = &state.settings.auth.password_requirements;
    if !validate_password_strength(&req.password, requirements) {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {} characters and mix uppercase, lowercase, digit and special characters",
            requirements.min_length
        )));
    }

    let mut plain = req.password;
    let hash =
        hash_password_secure(&mut plain).map_err(|e| AppError::Internal(e.to_string()))?;

    let user = UserRecord::new(req.email, req.name, Some(hash), Role::Client);
    state.users.create_user(&user).await?;
    info!(email = %user.email, "principal registered");

    Ok((StatusCode::CREATED, Json(PrincipalSummary::from(&user))))
}

/// Identity echo for the authenticated principal; works behind either
/// gate since both attach an `AuthContext`.
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse {
        id: ctx.user_id,
        email: ctx.email,
        role: ctx.role,
        expires_at: ctx.expires_at,
    })
}

/// Set a real password for the authenticated principal. For the
/// bootstrap administrator this permanently retires the provisioning
/// credential.
pub async fn set_password<S: UserStore + Clone + Send + Sync + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let requirements = &state.settings.auth.password_requirements;
    if !validate_password_strength(&req.password, requirements) {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {} characters and mix uppercase, lowercase, digit and special characters",
            requirements.min_length
        )));
    }

    let mut plain = req.password;
    let hash =
        hash_password_secure(&mut plain).map_err(|e| AppError::Internal(e.to_string()))?;
    state.users.set_password_hash(&ctx.email, &hash).await?;
    info!(email = %ctx.email, "password updated");

    Ok(Json(AckResponse { success: true }))
}

/// Client IP as reported by the reverse proxy
fn client_ip(headers: &HeaderMap) -> IpAddr {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]))
}

// ============================
// crates/backend-lib/src/router.rs
// ============================
//! Router assembly.
use crate::handlers::auth;
use crate::middleware::{admin_gate, api_auth};
use crate::storage::UserStore;
use crate::AppState;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
///
/// Three surfaces: the gated admin subtree (cookie sessions), the
/// bearer-gated API subtree (claims tokens), and the public auth
/// endpoints.
pub fn create_router<S: UserStore + Clone + Send + Sync + 'static>(
    state: Arc<AppState<S>>,
) -> Router {
    let admin = Router::new()
        .route("/admin/login", get(auth::login_page).post(auth::login::<S>))
        .route("/admin/logout", post(auth::logout::<S>))
        .route("/admin/me", get(auth::me))
        .route("/admin/password", post(auth::set_password::<S>))
        .layer(from_fn_with_state(state.clone(), admin_gate::<S>))
        .with_state(state.clone());

    let api = Router::new()
        .route("/api/me", get(auth::me))
        .layer(from_fn_with_state(state.clone(), api_auth::<S>))
        .with_state(state.clone());

    let public = Router::new()
        .route("/api/auth/login", post(auth::api_login::<S>))
        .route("/api/auth/register", post(auth::register::<S>))
        .with_state(state);

    Router::new()
        .merge(admin)
        .merge(api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const SESSION_CREATED: &str = "auth.session.created";
pub const SESSION_INVALIDATED: &str = "auth.session.invalidated";
pub const SESSIONS_ACTIVE: &str = "auth.session.active";
pub const SESSIONS_EXPIRED: &str = "auth.session.expired";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const GATE_DENIED: &str = "auth.gate.denied";
pub const GATE_FORBIDDEN: &str = "auth.gate.forbidden";

// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default number of failed attempts before lockout
const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT: Duration = Duration::from_secs(5 * 60);

/// How long stale entries are retained before cleanup drops them
const RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct AttemptEntry {
    failures: u32,
    last_failure: Instant,
}

/// Tracks failed login attempts per client IP and locks out clients
/// that keep failing.
#[derive(Debug, Clone)]
pub struct LoginRateLimiter {
    attempts: Arc<DashMap<IpAddr, AttemptEntry>>,
    max_failures: u32,
    lockout: Duration,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES, DEFAULT_LOCKOUT)
    }
}

impl LoginRateLimiter {
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_failures,
            lockout,
        }
    }

    /// Whether this client is currently locked out
    pub fn is_locked(&self, ip: IpAddr) -> bool {
        self.attempts
            .get(&ip)
            .map(|entry| {
                entry.failures >= self.max_failures && entry.last_failure.elapsed() < self.lockout
            })
            .unwrap_or(false)
    }

    /// Record a failed login attempt
    pub fn record_failure(&self, ip: IpAddr) {
        let mut entry = self.attempts.entry(ip).or_insert_with(|| AttemptEntry {
            failures: 0,
            last_failure: Instant::now(),
        });

        // An expired lockout starts a fresh window
        if entry.failures >= self.max_failures && entry.last_failure.elapsed() >= self.lockout {
            entry.failures = 0;
        }

        entry.failures += 1;
        entry.last_failure = Instant::now();

        if entry.failures == self.max_failures {
            tracing::warn!(%ip, "login attempts locked out");
        }
    }

    /// Record a successful login; clears the failure history
    pub fn record_success(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Drop entries with no recent failures
    pub fn cleanup(&self) {
        self.attempts
            .retain(|_, entry| entry.last_failure.elapsed() < RETENTION);
    }
}

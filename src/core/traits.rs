//! Core traits - Injectable time and nonce sources for signing

use parking_lot::RwLock;

/// Source of the current unix time in seconds.
///
/// Signers read it for `oauth_timestamp` and URL expiry, verifiers read it for
/// the TTL check. Injecting one shared clock into both keeps tests consistent.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Source of `oauth_nonce` values
pub trait NonceSource: Send + Sync {
    fn nonce(&self) -> String;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Settable clock for deterministic signing and TTL tests
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<i64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self { now: RwLock::new(now) }
    }

    pub fn set(&self, now: i64) {
        *self.now.write() = now;
    }

    pub fn advance(&self, seconds: i64) {
        *self.now.write() += seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        *self.now.read()
    }
}

/// Random nonce, one UUIDv4 per call
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceSource for RandomNonce {
    fn nonce(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Returns the same nonce on every call
#[derive(Debug, Clone)]
pub struct FixedNonce(String);

impl FixedNonce {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }
}

impl NonceSource for FixedNonce {
    fn nonce(&self) -> String {
        self.0.clone()
    }
}

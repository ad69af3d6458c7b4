use std::time::Duration;

use moka::future::Cache;

use crate::{models::usermodel::UserRole, service::error::ServiceError};

const MAX_PENDING_REGISTRATIONS: u64 = 10_000;

/// A registration waiting for its emailed one-time code. The password is
/// already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRegistration {
    pub code: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Pending registrations keyed by email, each expiring after a fixed TTL.
#[derive(Clone)]
pub struct OtpStore {
    inner: Cache<String, PendingRegistration>,
    ttl: Duration,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_PENDING_REGISTRATIONS)
                .time_to_live(ttl)
                .build(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores (or replaces) the pending registration for its email.
    pub async fn put(&self, registration: PendingRegistration) {
        self.inner.insert(key(&registration.email), registration).await;
    }

    /// Consumes the pending registration when the code matches. A wrong code
    /// leaves the entry in place until it expires.
    pub async fn verify(&self, email: &str, code: &str) -> Result<PendingRegistration, ServiceError> {
        let key = key(email);
        let pending = self.inner.get(&key).await.ok_or_else(|| {
            ServiceError::validation("Verification code has expired or was never requested")
        })?;

        if pending.code != code.trim() {
            return Err(ServiceError::validation("Invalid verification code"));
        }

        self.inner.invalidate(&key).await;
        Ok(pending)
    }
}

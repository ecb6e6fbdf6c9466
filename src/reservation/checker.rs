use std::future::Future;
use std::time::Duration;
use tracing::warn;

use super::types::{normalize, Availability};
use super::validation::username_rule_violation;
use crate::error::Result;
use crate::store::{SharedStore, StoreError};

pub const TAKEN_MESSAGE: &str = "This username is already taken.";

/// Why a username can or cannot be claimed
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Available,
    Invalid(&'static str),
    Taken,
}

impl From<Verdict> for Availability {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Available => Availability::available(),
            Verdict::Invalid(reason) => Availability::unavailable(reason),
            Verdict::Taken => Availability::unavailable(TAKEN_MESSAGE),
        }
    }
}

/// Applies the username rules, then asks the store
#[derive(Clone)]
pub struct AvailabilityChecker {
    store: SharedStore,
    timeout: Duration,
}

impl AvailabilityChecker {
    pub fn new(store: SharedStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn check(&self, username: &str) -> Result<Availability> {
        self.evaluate(username).await.map(Availability::from)
    }

    /// Rule failures never reach the store
    pub async fn evaluate(&self, username: &str) -> Result<Verdict> {
        if let Some(reason) = username_rule_violation(username) {
            return Ok(Verdict::Invalid(reason));
        }

        let key = normalize(username);
        let taken = bounded(self.timeout, self.store.exists(&key)).await?;
        Ok(if taken { Verdict::Taken } else { Verdict::Available })
    }
}

/// Run a store call under a deadline, treating expiry as a store failure
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> std::result::Result<T, StoreError>
where
    F: Future<Output = std::result::Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            let millis = limit.as_millis() as u64;
            warn!("Store call exceeded {}ms", millis);
            Err(StoreError::Timeout { millis })
        }
    }
}

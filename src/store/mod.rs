//! Username registry
//!
//! The reservation flow only talks to the [`UsernameStore`] trait, so the
//! in-process map can be swapped for a real database without touching the
//! validation or workflow code.

mod memory;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::reservation::Reservation;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Store operation timed out after {millis}ms")]
    Timeout { millis: u64 },
}

/// Outcome of an atomic compare-and-insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already present; nothing was written
    Conflict,
}

/// Storage backend for reserved usernames
///
/// Keys are already normalized by the caller. `insert` must be atomic:
/// two concurrent inserts of the same key yield exactly one `Inserted`.
#[async_trait]
pub trait UsernameStore: Send + Sync {
    /// Check whether a key has been reserved
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Reserve `reservation.normalized` unless it is already taken
    async fn insert(&self, reservation: Reservation) -> Result<InsertOutcome, StoreError>;
}

/// Shared store type
pub type SharedStore = Arc<dyn UsernameStore>;

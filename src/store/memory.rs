use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::{InsertOutcome, StoreError, UsernameStore};
use crate::reservation::Reservation;

/// Process-lifetime registry. Empty at start, only ever grows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    reservations: DashMap<String, Reservation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn get(&self, key: &str) -> Option<Reservation> {
        self.reservations.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.reservations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }
}

#[async_trait]
impl UsernameStore for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.reservations.contains_key(key))
    }

    async fn insert(&self, reservation: Reservation) -> Result<InsertOutcome, StoreError> {
        // The entry guard holds the shard lock, so check and write are one step
        match self.reservations.entry(reservation.normalized.clone()) {
            Entry::Occupied(_) => {
                debug!("Insert rejected, '{}' already reserved", reservation.normalized);
                Ok(InsertOutcome::Conflict)
            }
            Entry::Vacant(slot) => {
                slot.insert(reservation);
                Ok(InsertOutcome::Inserted)
            }
        }
    }
}

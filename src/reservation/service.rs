use std::sync::Arc;
use tracing::{debug, info};

use super::checker::{bounded, AvailabilityChecker, Verdict};
use super::types::{Reservation, ReservationRequest};
use super::validation::validate_form;
use crate::error::{ReserveError, Result};
use crate::store::InsertOutcome;

/// Validates, checks and claims usernames
///
/// Nothing is written unless every check passed, and the write itself is the
/// store's atomic compare-and-insert, so concurrent claims of one name leave
/// exactly one winner.
pub struct ReservationService {
    checker: AvailabilityChecker,
}

impl ReservationService {
    pub fn new(checker: AvailabilityChecker) -> Self {
        Self { checker }
    }

    pub fn checker(&self) -> &AvailabilityChecker {
        &self.checker
    }

    pub async fn reserve(&self, request: &ReservationRequest) -> Result<Reservation> {
        validate_form(request)?;

        match self.checker.evaluate(&request.username).await? {
            Verdict::Available => {}
            Verdict::Invalid(reason) => {
                debug!("Rejected username '{}': {}", request.username, reason);
                return Err(ReserveError::validation(reason));
            }
            Verdict::Taken => {
                debug!("Username '{}' is already taken", request.username);
                return Err(ReserveError::Conflict {
                    username: request.username.clone(),
                });
            }
        }

        let reservation = Reservation::from_request(request);
        let store = self.checker.store();
        match bounded(self.checker.timeout(), store.insert(reservation.clone())).await? {
            InsertOutcome::Inserted => {
                info!(
                    "Reserved username '{}' for discord handle '{}'",
                    reservation.username, reservation.discord_handle
                );
                Ok(reservation)
            }
            InsertOutcome::Conflict => {
                // Someone else claimed it between the check and the insert
                debug!("Lost race for username '{}'", request.username);
                Err(ReserveError::Conflict {
                    username: request.username.clone(),
                })
            }
        }
    }
}

/// Shared reservation service type
pub type SharedReservationService = Arc<ReservationService>;

pub fn create_shared_reservation_service(checker: AvailabilityChecker) -> SharedReservationService {
    Arc::new(ReservationService::new(checker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::validation::{EMAIL_INVALID_MESSAGE, USERNAME_TOO_SHORT_MESSAGE};
    use crate::store::{MemoryStore, StoreError, UsernameStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn service_with(store: Arc<MemoryStore>) -> ReservationService {
        ReservationService::new(AvailabilityChecker::new(store, Duration::from_secs(1)))
    }

    fn request(username: &str) -> ReservationRequest {
        ReservationRequest::new(username, "john#1234", "john@example.com")
    }

    /// Counts calls and fails every insert
    #[derive(Default)]
    struct FlakyStore {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl UsernameStore for FlakyStore {
        async fn exists(&self, _key: &str) -> std::result::Result<bool, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn insert(&self, _reservation: Reservation) -> std::result::Result<InsertOutcome, StoreError> {
            Err(StoreError::Unavailable {
                message: "connection reset".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_short_username_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = service_with(store.clone()).reserve(&request("ab")).await.unwrap_err();

        assert_eq!(err, ReserveError::validation(USERNAME_TOO_SHORT_MESSAGE));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_reserve_new_username() {
        let store = Arc::new(MemoryStore::new());
        let reservation = service_with(store.clone()).reserve(&request("john_doe")).await.unwrap();

        assert_eq!(reservation.username, "john_doe");
        assert!(store.contains("john_doe"));
    }

    #[tokio::test]
    async fn test_case_insensitive_collision() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone());

        service.reserve(&request("John_Doe")).await.unwrap();
        let err = service.reserve(&request("john_doe")).await.unwrap_err();

        assert!(matches!(err, ReserveError::Conflict { .. }));
        assert_eq!(err.user_message(), "This username is already taken.");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_email_fails_before_lookup() {
        let store = Arc::new(FlakyStore::default());
        let service = ReservationService::new(AvailabilityChecker::new(store.clone(), Duration::from_secs(1)));

        let bad = ReservationRequest::new("john_doe", "john#1234", "not-an-email");
        let err = service.reserve(&bad).await.unwrap_err();

        assert_eq!(err, ReserveError::validation(EMAIL_INVALID_MESSAGE));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_transient() {
        let store = Arc::new(FlakyStore::default());
        let service = ReservationService::new(AvailabilityChecker::new(store.clone(), Duration::from_secs(1)));

        let err = service.reserve(&request("john_doe")).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(service_with(store.clone()));

        let handles: Vec<_> = ["same_name", "Same_Name", "SAME_NAME", "same_name"]
            .into_iter()
            .map(|name| {
                let service = service.clone();
                tokio::spawn(async move { service.reserve(&request(name)).await })
            })
            .collect();

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(ReserveError::Conflict { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(conflicts, 3);
        assert_eq!(store.len(), 1);
    }
}

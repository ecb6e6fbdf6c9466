pub mod checker;
pub mod service;
pub mod types;
pub mod validation;

pub use checker::{AvailabilityChecker, TAKEN_MESSAGE};
pub use service::{create_shared_reservation_service, SharedReservationService};
pub use types::{Availability, Reservation, ReservationRequest};
pub use validation::validate_form;

//! Reservation modal state machine and the per-visitor session registry

pub mod flow;
pub mod sessions;

pub use flow::{FlowSnapshot, FormField, ReservationFlow};
pub use sessions::{create_shared_flow_registry, spawn_sweeper, SharedFlowRegistry};

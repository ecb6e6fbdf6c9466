//! Human verification placeholder
//!
//! No challenge is ever checked: pressing the button marks the visitor as
//! verified and sends them back to the landing page after a short delay.
//! A real captcha integration has to replace [`VerificationGate::verify`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationState {
    Unverified,
    Verified,
}

impl VerificationState {
    /// Move to `Verified`. Returns false if already there.
    pub fn verify(&mut self) -> bool {
        match self {
            VerificationState::Unverified => {
                *self = VerificationState::Verified;
                true
            }
            VerificationState::Verified => false,
        }
    }
}

/// Where to send the visitor once verified
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub visitor_id: Uuid,
    pub state: VerificationState,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

/// Hands out redirect instructions to visitors who press the verify button
///
/// Nothing is stored per visitor: the page keeps its own state and the
/// button is disabled after the first press.
pub struct VerificationGate {
    redirect_to: String,
    redirect_after_ms: u64,
}

impl VerificationGate {
    pub fn new(redirect_to: impl Into<String>, redirect_after_ms: u64) -> Self {
        Self {
            redirect_to: redirect_to.into(),
            redirect_after_ms,
        }
    }

    /// Run the toggle for one button press. No challenge is checked.
    pub fn verify(&self, visitor_id: Option<Uuid>) -> VerifyOutcome {
        let visitor_id = visitor_id.unwrap_or_else(Uuid::new_v4);

        let mut state = VerificationState::Unverified;
        if state.verify() {
            info!("Visitor {} marked as verified", visitor_id);
        }

        VerifyOutcome {
            visitor_id,
            state,
            redirect_to: self.redirect_to.clone(),
            redirect_after_ms: self.redirect_after_ms,
        }
    }
}

/// Shared verification gate type
pub type SharedVerificationGate = Arc<VerificationGate>;

pub fn create_shared_verification_gate(redirect_after_ms: u64) -> SharedVerificationGate {
    Arc::new(VerificationGate::new("/", redirect_after_ms))
}

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::TRY_AGAIN_MESSAGE;
use crate::reservation::{validate_form, Reservation, ReservationRequest, SharedReservationService};

/// Where a reservation form currently is
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FlowState {
    Idle,
    Submitting,
    Secured { username: String },
    Failed { reason: String },
}

/// Editable form fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Username,
    #[serde(alias = "discordUsername")]
    DiscordHandle,
    Email,
}

/// Read-only view of a flow for rendering
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub open: bool,
    pub state: FlowState,
    pub form: ReservationRequest,
    /// Whether the submit button should be enabled
    pub can_submit: bool,
}

/// What a call to [`ReservationFlow::submit`] ended in
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Secured(Reservation),
    Failed(String),
    /// A submission is already running, or the success view is showing
    Ignored,
    /// The modal was closed while the request was in flight
    Abandoned,
}

struct FlowInner {
    open: bool,
    form: ReservationRequest,
    state: FlowState,
    /// Bumped on close and reset so stale completions and timers can tell
    generation: u64,
    reset_task: Option<JoinHandle<()>>,
    last_activity: Instant,
}

impl FlowInner {
    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    fn reset(&mut self) {
        self.open = false;
        self.form = ReservationRequest::default();
        self.state = FlowState::Idle;
        self.generation += 1;
        self.reset_task = None;
        self.touch();
    }

    fn snapshot(&self) -> FlowSnapshot {
        let filled = !self.form.username.trim().is_empty()
            && !self.form.discord_handle.trim().is_empty()
            && !self.form.email.trim().is_empty();
        let busy = matches!(self.state, FlowState::Submitting | FlowState::Secured { .. });

        FlowSnapshot {
            open: self.open,
            state: self.state.clone(),
            form: self.form.clone(),
            can_submit: self.open && filled && !busy,
        }
    }
}

/// One visitor's reservation modal
///
/// `Idle -> Submitting -> Secured | Failed`, with `Failed -> Idle` on the next
/// edit. After `Secured` a reset task clears the form and closes the modal
/// once the display window has passed.
pub struct ReservationFlow {
    service: SharedReservationService,
    display_window: Duration,
    inner: Arc<Mutex<FlowInner>>,
}

impl ReservationFlow {
    pub fn new(service: SharedReservationService, display_window: Duration) -> Self {
        Self {
            service,
            display_window,
            inner: Arc::new(Mutex::new(FlowInner {
                open: false,
                form: ReservationRequest::default(),
                state: FlowState::Idle,
                generation: 0,
                reset_task: None,
                last_activity: Instant::now(),
            })),
        }
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn state(&self) -> FlowState {
        self.inner.lock().state.clone()
    }

    pub fn idle_for(&self) -> Duration {
        self.inner.lock().last_activity.elapsed()
    }

    pub fn open(&self) -> FlowSnapshot {
        let mut inner = self.inner.lock();
        inner.open = true;
        inner.touch();
        inner.snapshot()
    }

    /// Close the modal. Refused while the success view is showing.
    ///
    /// Entered values are kept. A submission still in flight is abandoned:
    /// its store call finishes, but its result no longer touches this flow.
    pub fn close(&self) -> bool {
        let mut inner = self.inner.lock();
        if matches!(inner.state, FlowState::Secured { .. }) {
            return false;
        }
        inner.open = false;
        inner.generation += 1;
        if inner.state == FlowState::Submitting {
            inner.state = FlowState::Idle;
        }
        inner.touch();
        true
    }

    /// Update one field. Inputs are locked while submitting or secured.
    pub fn edit(&self, field: FormField, value: impl Into<String>) -> bool {
        let mut inner = self.inner.lock();
        if matches!(inner.state, FlowState::Submitting | FlowState::Secured { .. }) {
            return false;
        }

        let value = value.into();
        match field {
            FormField::Username => inner.form.username = value,
            FormField::DiscordHandle => inner.form.discord_handle = value,
            FormField::Email => inner.form.email = value,
        }
        if matches!(inner.state, FlowState::Failed { .. }) {
            inner.state = FlowState::Idle;
        }
        inner.touch();
        true
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (request, generation) = {
            let mut inner = self.inner.lock();
            if !inner.open
                || matches!(inner.state, FlowState::Submitting | FlowState::Secured { .. })
            {
                return SubmitOutcome::Ignored;
            }
            inner.touch();

            if let Err(e) = validate_form(&inner.form) {
                let reason = e.user_message();
                inner.state = FlowState::Failed {
                    reason: reason.clone(),
                };
                return SubmitOutcome::Failed(reason);
            }

            inner.state = FlowState::Submitting;
            (inner.form.clone(), inner.generation)
        };

        // The store call and the state change run on their own task, so a
        // caller that goes away mid-request cannot leave the flow in Submitting
        let inner = self.inner.clone();
        let service = self.service.clone();
        let window = self.display_window;
        let task = tokio::spawn(async move {
            let result = service.reserve(&request).await;
            complete(&inner, generation, &request, result, window)
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Reservation task for generation {} failed: {}", generation, e);
                let mut inner = self.inner.lock();
                if inner.generation != generation || inner.state != FlowState::Submitting {
                    return SubmitOutcome::Abandoned;
                }
                inner.state = FlowState::Failed {
                    reason: TRY_AGAIN_MESSAGE.to_string(),
                };
                SubmitOutcome::Failed(TRY_AGAIN_MESSAGE.to_string())
            }
        }
    }
}

/// Apply a finished reservation call to the flow it was started from
fn complete(
    flow: &Arc<Mutex<FlowInner>>,
    generation: u64,
    request: &ReservationRequest,
    result: crate::error::Result<Reservation>,
    window: Duration,
) -> SubmitOutcome {
    let mut inner = flow.lock();
    if inner.generation != generation {
        debug!("Dropping result for '{}', modal was closed", request.username);
        return SubmitOutcome::Abandoned;
    }
    inner.touch();

    match result {
        Ok(reservation) => {
            inner.state = FlowState::Secured {
                username: reservation.username.clone(),
            };
            inner.reset_task = Some(schedule_reset(flow, generation, window));
            SubmitOutcome::Secured(reservation)
        }
        Err(e) => {
            if e.is_retryable() {
                warn!("Error securing username '{}': {}", request.username, e);
            }
            let reason = e.user_message();
            inner.state = FlowState::Failed {
                reason: reason.clone(),
            };
            SubmitOutcome::Failed(reason)
        }
    }
}

fn schedule_reset(flow: &Arc<Mutex<FlowInner>>, generation: u64, window: Duration) -> JoinHandle<()> {
    let weak: Weak<Mutex<FlowInner>> = Arc::downgrade(flow);

    tokio::spawn(async move {
        tokio::time::sleep(window).await;
        if let Some(inner) = weak.upgrade() {
            let mut inner = inner.lock();
            if inner.generation == generation {
                inner.reset();
            }
        }
    })
}

impl Drop for ReservationFlow {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().reset_task.take() {
            task.abort();
        }
    }
}

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::flow::ReservationFlow;
use crate::reservation::SharedReservationService;

/// Flows untouched for this long are dropped by the sweeper
pub const SESSION_IDLE_LIMIT: Duration = Duration::from_secs(3600);

/// All open reservation modals, keyed by session id
pub struct FlowRegistry {
    service: SharedReservationService,
    display_window: Duration,
    flows: DashMap<Uuid, Arc<ReservationFlow>>,
}

impl FlowRegistry {
    pub fn new(service: SharedReservationService, display_window: Duration) -> Self {
        Self {
            service,
            display_window,
            flows: DashMap::new(),
        }
    }

    /// Start a new flow with its modal already open
    pub fn create(&self) -> (Uuid, Arc<ReservationFlow>) {
        let id = Uuid::new_v4();
        let flow = Arc::new(ReservationFlow::new(self.service.clone(), self.display_window));
        flow.open();
        self.flows.insert(id, flow.clone());
        debug!("Opened reservation session {}", id);
        (id, flow)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<ReservationFlow>> {
        self.flows.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Drop flows idle for longer than `max_idle`, returning how many went
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.len();
        self.flows.retain(|_, flow| flow.idle_for() < max_idle);
        let removed = before.saturating_sub(self.len());
        if removed > 0 {
            info!("Swept {} idle reservation sessions, {} still open", removed, self.len());
        }
        removed
    }
}

/// Shared flow registry type
pub type SharedFlowRegistry = Arc<FlowRegistry>;

pub fn create_shared_flow_registry(
    service: SharedReservationService,
    display_window: Duration,
) -> SharedFlowRegistry {
    Arc::new(FlowRegistry::new(service, display_window))
}

/// Periodically sweep idle flows until the task is aborted
pub fn spawn_sweeper(registry: SharedFlowRegistry, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            registry.sweep_idle(SESSION_IDLE_LIMIT);
        }
    })
}

//! Router construction and server startup

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Router,
};
use axum_server::{tls_rustls::RustlsConfig, Handle};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::api;
use super::pages;
use crate::config::AppConfig;
use crate::reservation::{create_shared_reservation_service, AvailabilityChecker, SharedReservationService};
use crate::store::{MemoryStore, SharedStore};
use crate::verification::{create_shared_verification_gate, SharedVerificationGate};
use crate::workflow::{create_shared_flow_registry, SharedFlowRegistry};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Shared state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reservations: SharedReservationService,
    pub flows: SharedFlowRegistry,
    pub verification: SharedVerificationGate,
}

/// Wire the default in-memory registry into a fresh state
pub fn build_state(config: AppConfig) -> AppState {
    let store: SharedStore = Arc::new(MemoryStore::new());
    build_state_with_store(config, store)
}

pub fn build_state_with_store(config: AppConfig, store: SharedStore) -> AppState {
    let checker = AvailabilityChecker::new(store, config.availability_timeout());
    let reservations = create_shared_reservation_service(checker);
    let flows = create_shared_flow_registry(reservations.clone(), config.success_display());
    let verification = create_shared_verification_gate(config.verify_redirect_ms);

    AppState {
        config: Arc::new(config),
        reservations,
        flows,
        verification,
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/verify", get(verify_page).post(api::verify))
        .route("/health", get(api::health))
        .route("/reservations", post(api::create_reservation))
        .route("/reservations/availability", get(api::check_availability))
        .route("/sessions", post(api::create_session))
        .route(
            "/sessions/:id",
            get(api::get_session)
                .patch(api::edit_session)
                .delete(api::close_session),
        )
        .route("/sessions/:id/open", post(api::open_session))
        .route("/sessions/:id/submit", post(api::submit_session))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the process is stopped. HTTPS when a certificate pair is configured.
pub async fn start_web_server(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();
    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.http_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{}:{}': {}", config.bind_address, config.http_port, e))?;

    let app = router(state);

    match (&config.cert_path, &config.key_path) {
        (Some(cert_path), Some(key_path)) => {
            info!("Loading TLS certificates:");
            info!("  Certificate: {}", cert_path.display());
            info!("  Private key: {}", key_path.display());

            if !cert_path.exists() {
                return Err(anyhow::anyhow!(
                    "Certificate file not found: {}",
                    cert_path.display()
                ));
            }
            if !key_path.exists() {
                return Err(anyhow::anyhow!(
                    "Private key file not found: {}",
                    key_path.display()
                ));
            }

            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path)
                .await
                .map_err(|e| anyhow::anyhow!(
                    "Failed to load TLS certificates: {}\n  Certificate: {}\n  Private key: {}",
                    e, cert_path.display(), key_path.display()
                ))?;

            let handle = Handle::new();
            watch_shutdown(handle.clone(), shutdown_signal());

            info!("Reservation server listening on https://{}", addr);
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        _ => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("Reservation server listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    Ok(())
}

/// Drain open connections once `signal` resolves
fn watch_shutdown<F>(handle: Handle, signal: F) -> tokio::task::JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        signal.await;
        handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// GET / - landing page with the reservation modal
async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(pages::landing_page(&state.config))
}

/// GET /verify - human verification placeholder
async fn verify_page(State(state): State<AppState>) -> Html<String> {
    Html(pages::verify_page(&state.config))
}

async fn not_found() -> (StatusCode, Html<String>) {
    (
        StatusCode::NOT_FOUND,
        Html(pages::error_page("This page does not exist.")),
    )
}

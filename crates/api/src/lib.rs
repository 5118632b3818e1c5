//! Driver Monitoring API Server
//!
//! REST API for fleet operators and the in-cab display: check-in and
//! check-out, sample ingestion, fatigue/alert/correlation views, emergency
//! declaration and Prometheus metrics.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use session::{ChannelDispatcher, DispatchRequest, InMemorySummaryLog, SessionManager};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
mod routes;
pub mod settings;

pub use error::{ApiError, ApiResult};
pub use settings::Settings;

/// Application state shared across handlers
pub struct AppState {
    /// Active monitoring sessions
    pub manager: SessionManager,
    /// Summaries of checked-out sessions
    pub summaries: Arc<InMemorySummaryLog>,
    /// Prometheus exposition
    pub metrics: PrometheusHandle,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        manager: SessionManager,
        summaries: Arc<InMemorySummaryLog>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            manager,
            summaries,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub alert_subscribers: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    use routes::{alerts, analysis, samples, sessions};

    let session_routes = Router::new()
        .route("/", post(sessions::check_in).get(sessions::list_sessions))
        .route("/:session_id", delete(sessions::check_out))
        .route("/:session_id/samples", post(samples::ingest))
        .route("/:session_id/fatigue", get(analysis::get_fatigue))
        .route("/:session_id/correlations", get(analysis::get_correlations))
        .route("/:session_id/diagnostics", get(analysis::get_diagnostics))
        .route("/:session_id/emergency", post(analysis::declare_emergency))
        .route("/:session_id/alerts", get(alerts::get_alerts))
        .route("/:session_id/alerts/history", get(alerts::get_history))
        .route("/:session_id/alerts/:alert_id/ack", post(alerts::acknowledge))
        .route("/:session_id/alerts/:alert_id/clear", post(alerts::clear));

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/summaries", get(sessions::list_summaries))
        .nest("/api/v1/sessions", session_routes)
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_sessions: state.manager.active_count().await,
        alert_subscribers: state.manager.subscriber_count(),
    };

    Json(response)
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Initialize logging
pub fn init_logging(json: bool) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    if json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(Level::INFO)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Forward emergency requests to the dispatch service.
///
/// The receiving side of the session dispatcher; logs every request until
/// all senders are gone.
async fn run_dispatch_forwarder(mut requests: mpsc::Receiver<DispatchRequest>) {
    while let Some(request) = requests.recv().await {
        warn!(
            session_id = %request.session_id,
            driver_id = %request.driver_id,
            vehicle_id = %request.vehicle_id,
            alert_id = %request.alert.id,
            location = request.location.as_deref().unwrap_or("unknown"),
            reason = %request.reason,
            "forwarding emergency to dispatch"
        );
    }
    info!("dispatch forwarder stopped");
}

/// Run the server until Ctrl-C, then check out every session
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let metrics = PrometheusBuilder::new().install_recorder()?;

    let (dispatcher, requests) = ChannelDispatcher::channel(settings.dispatch_queue);
    tokio::spawn(run_dispatch_forwarder(requests));

    let summaries = Arc::new(InMemorySummaryLog::new(settings.summary_retention));
    let manager = SessionManager::new(
        settings.monitor.clone(),
        Arc::new(dispatcher),
        summaries.clone(),
    )?;
    let state = Arc::new(AppState::new(manager, summaries, metrics));
    let app = create_router(state.clone());

    info!("Starting API server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for shutdown signal");
            }
        })
        .await?;

    let summaries = state.manager.shutdown().await;
    info!(sessions = summaries.len(), "server stopped");
    Ok(())
}

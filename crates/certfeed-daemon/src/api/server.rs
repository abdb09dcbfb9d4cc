use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::{get, post};
use axum::Router;
use certfeed_types::{CertfeedError, CertfeedResult};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use super::middleware::{require_admin, AdminAuth};
use crate::config::ApiConfig;
use crate::daemon::Daemon;
use crate::registry::{AdmissionController, RootRegistry};
use crate::storage::SledLedger;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<AdmissionController>,
    pub roots: Arc<dyn RootRegistry>,
    pub auth: Arc<AdminAuth>,
    pub storage: Option<Arc<SledLedger>>,
    pub zk_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        controller: Arc<AdmissionController>,
        roots: Arc<dyn RootRegistry>,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            controller,
            roots,
            auth: Arc::new(AdminAuth::new(admin_token)),
            storage: None,
            zk_enabled: false,
            started_at: Instant::now(),
        }
    }

    pub fn from_daemon(daemon: &Daemon) -> Self {
        let mut state = Self::new(
            daemon.controller(),
            daemon.roots(),
            daemon.config().security.admin_token.clone(),
        );
        state.storage = daemon.storage();
        state.zk_enabled = daemon.verifier_enabled();
        state
    }
}

/// Routes without transport layers; tests drive this directly.
pub fn router(state: AppState) -> Router {
    routes(state, None)
}

/// `timeout` bounds every route except submission. Admission runs on the
/// blocking pool and keeps going when the request future is dropped, so a
/// timed-out submission could still be admitted and its retry would then
/// come back as a duplicate.
fn routes(state: AppState, timeout: Option<Duration>) -> Router {
    let admin = Router::new()
        .route("/v1/roots", post(handlers::publish_root))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_admin));

    let mut bounded = Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/feedbacks", get(handlers::all_feedbacks))
        .route("/v1/courses", get(handlers::list_courses))
        .route("/v1/courses/:course/feedbacks", get(handlers::course_feedbacks))
        .route("/v1/courses/:course/root", get(handlers::course_root))
        .route("/v1/courses/:course/roots", get(handlers::root_history))
        .route("/v1/stats", get(handlers::stats))
        .merge(admin);
    if let Some(timeout) = timeout {
        bounded = bounded.layer(TimeoutLayer::new(timeout));
    }

    Router::new()
        .route("/v1/feedback", post(handlers::submit_feedback))
        .merge(bounded)
        .with_state(state)
}

pub fn app(state: AppState, config: &ApiConfig) -> Router {
    let app = routes(state, Some(Duration::from_secs(config.request_timeout_secs)))
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(TraceLayer::new_for_http());

    if config.cors_enabled {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub struct ApiServer {
    addr: SocketAddr,
    app: Router,
}

impl ApiServer {
    pub fn new(addr: SocketAddr, state: AppState, config: &ApiConfig) -> Self {
        if !state.auth.is_enabled() {
            warn!("No admin token configured; POST /v1/roots is disabled");
        }
        Self {
            addr,
            app: app(state, config),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn serve<F>(self, shutdown: F) -> CertfeedResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| CertfeedError::Internal(format!("Failed to bind API server: {}", e)))?;

        info!("API server listening on http://{}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CertfeedError::Internal(format!("API server error: {}", e)))?;

        info!("API server stopped");
        Ok(())
    }
}

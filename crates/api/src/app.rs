use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{ChannelSender, DispatchEngine};
use domain::store::{
    DeliveryLogStore, InMemoryDeliveryLogStore, InMemoryPreferenceStore, PreferenceStore,
};
use persistence::repositories::{DeliveryLogRepository, UserPreferenceRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, StorageBackend};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, notifications, preferences};

/// Store implementations the service runs on.
#[derive(Clone)]
pub struct Backend {
    pub kind: StorageBackend,
    pub preferences: Arc<dyn PreferenceStore>,
    pub logs: Arc<dyn DeliveryLogStore>,
    pub pool: Option<PgPool>,
}

impl Backend {
    /// Process-local stores; state is lost on restart.
    pub fn in_memory() -> Self {
        Self {
            kind: StorageBackend::Memory,
            preferences: Arc::new(InMemoryPreferenceStore::new()),
            logs: Arc::new(InMemoryDeliveryLogStore::new()),
            pool: None,
        }
    }

    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            kind: StorageBackend::Postgres,
            preferences: Arc::new(UserPreferenceRepository::new(pool.clone())),
            logs: Arc::new(DeliveryLogRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: Backend,
    pub engine: DispatchEngine,
}

impl AppState {
    /// Compose the dispatch engine from the backend stores and a sender.
    pub fn new(config: Config, backend: Backend, sender: Arc<dyn ChannelSender>) -> Self {
        let engine = DispatchEngine::new(
            Arc::clone(&backend.preferences),
            Arc::clone(&backend.logs),
            sender,
        )
        .with_send_timeout(config.delivery.send_timeout());

        Self {
            config: Arc::new(config),
            backend,
            engine,
        }
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.backend.preferences.as_ref()
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        .route("/api/preferences", post(preferences::create_preference))
        .route(
            "/api/preferences/:user_id",
            get(preferences::get_preference)
                .patch(preferences::update_preference)
                .delete(preferences::delete_preference),
        )
        .route(
            "/api/notifications/send",
            post(notifications::send_notification),
        )
        .route(
            "/api/notifications/:user_id/logs",
            get(notifications::list_logs),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

use crate::handlers::{connections, health_check, metrics, pipeline, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub struct ApiServer {
    host: String,
    port: u16,
    cors_enabled: bool,
    state: AppState,
}

impl ApiServer {
    pub fn new(host: String, port: u16, cors_enabled: bool, state: AppState) -> Self {
        Self {
            host,
            port,
            cors_enabled,
            state,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut app = Router::new()
            // Health
            .route("/health", get(health_check))
            // Connection management
            .route(
                "/api/connections",
                get(connections::list_connections).post(connections::create_connection),
            )
            .route(
                "/api/connections/{id}",
                axum::routing::delete(connections::delete_connection),
            )
            .route(
                "/api/connections/{id}/status",
                get(connections::connection_status).put(connections::update_connection_status),
            )
            .route("/api/connections/{id}/logs", get(connections::sync_logs))
            .route("/api/connections/{id}/sync", post(connections::sync_connection))
            // Pipeline
            .route("/api/etl/run-pipeline", post(pipeline::run_pipeline))
            // Metrics queries
            .route(
                "/api/metrics/features/{feature_id}",
                get(metrics::metrics_by_feature),
            )
            .route("/api/metrics/timerange", get(metrics::metrics_by_time_range))
            .with_state(self.state);

        if self.cors_enabled {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);

            app = app.layer(cors);
        }

        let addr = format!("{}:{}", self.host, self.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

use std::sync::Arc;

use axum::response::IntoResponse;
use serde::Serialize;

use metricsink_core::{EtlPipeline, MetricsStore};

use crate::ApiResponse;

pub mod connections;
pub mod metrics;
pub mod pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EtlPipeline>,
    pub store: Arc<dyn MetricsStore>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
    };

    ApiResponse::success(response, "Service is healthy")
}

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{handlers::AppState, ApiResponse};

pub async fn metrics_by_feature(
    State(state): State<AppState>,
    Path(feature_id): Path<String>,
) -> impl IntoResponse {
    match state.store.metrics_by_feature(&feature_id).await {
        Ok(metrics) => ApiResponse::success(metrics, "Metrics retrieved successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct TimeRangeQuery {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    metric: Option<String>,
}

pub async fn metrics_by_time_range(
    State(state): State<AppState>,
    Query(query): Query<TimeRangeQuery>,
) -> impl IntoResponse {
    match state
        .store
        .metrics_by_time_range(query.start, query.end, query.metric.as_deref())
        .await
    {
        Ok(metrics) => ApiResponse::success(metrics, "Metrics retrieved successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

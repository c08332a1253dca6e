use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use metricsink_core::{ConnectionStatus, NewConnection};

use crate::{handlers::AppState, ApiResponse};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<ConnectionStatus>,
}

pub async fn list_connections(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    match state.pipeline.list_connections(query.status).await {
        Ok(connections) => {
            ApiResponse::success(connections, "Connections retrieved successfully")
        }
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub async fn create_connection(
    State(state): State<AppState>,
    Json(data): Json<NewConnection>,
) -> impl IntoResponse {
    match state.pipeline.create_connection(data).await {
        Ok(connection) => ApiResponse::success(connection, "Connection created successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub async fn connection_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.pipeline.connection_status(id).await {
        Ok(summary) => ApiResponse::success(summary, "Connection status retrieved successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: ConnectionStatus,
}

pub async fn update_connection_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate>,
) -> ApiResponse<()> {
    match state.pipeline.set_connection_status(id, update.status).await {
        Ok(()) => ApiResponse::<()>::success_no_data("Connection status updated successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub async fn sync_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.pipeline.sync_connection(id).await {
        Ok(result) => ApiResponse::success(result, "Sync finished"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub async fn sync_logs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.pipeline.sync_logs(id).await {
        Ok(entries) => ApiResponse::success(entries, "Sync logs retrieved successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

pub async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResponse<()> {
    match state.pipeline.delete_connection(id).await {
        Ok(()) => ApiResponse::<()>::success_no_data("Connection deleted successfully"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

use axum::{extract::State, response::IntoResponse};

use crate::{handlers::AppState, ApiResponse};

pub async fn run_pipeline(State(state): State<AppState>) -> impl IntoResponse {
    match state.pipeline.run_full_pipeline().await {
        Ok(results) => ApiResponse::success(results, "Pipeline run finished"),
        Err(e) => ApiResponse::from_error(&e),
    }
}

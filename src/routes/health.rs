use axum::{Json, extract::State};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub service: String,
}

fn health(status: &str) -> HealthData {
    HealthData {
        status: status.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::success(
        "Health check",
        health("ok"),
        Some(Meta::empty()),
    ))
}

/// Round-trips a trivial query through the executor, retries included.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Store reachable", body = ApiResponse<HealthData>),
        (status = 503, description = "Store unreachable after retries"),
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HealthData>>> {
    let backend = state.executor.conn().get_database_backend();
    state
        .executor
        .execute(Statement::from_string(backend, "SELECT 1"))
        .await?;
    Ok(Json(ApiResponse::success(
        "Readiness check",
        health("ready"),
        Some(Meta::empty()),
    )))
}

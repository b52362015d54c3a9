use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::{catalog::CreatePackageRequest, orders::OrderList},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::PremadePackage,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{catalog_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packages", post(create_package))
        .route("/packages/{id}", delete(delete_package))
        .route("/orders", get(list_orders))
}

#[utoipa::path(
    post,
    path = "/api/farmer/packages",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = ApiResponse<PremadePackage>),
        (status = 400, description = "Every invalid field"),
        (status = 403, description = "Not the farm's owner"),
    ),
    security(("bearer_auth" = [])),
    tag = "Farmer"
)]
pub async fn create_package(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreatePackageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PremadePackage>>)> {
    let resp = catalog_service::create_package(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/farmer/packages/{id}",
    params(("id" = Uuid, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package deleted"),
        (status = 403, description = "Not the farm's owner"),
        (status = 404, description = "Package not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Farmer"
)]
pub async fn delete_package(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = catalog_service::delete_package(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/farmer/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders containing the farmer's products", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Farmer"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_farmer_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

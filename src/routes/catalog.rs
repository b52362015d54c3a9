use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::catalog::{FarmDetail, FarmList, PackageList, ProductList},
    error::AppResult,
    models::PremadePackage,
    response::ApiResponse,
    routes::params::{PackageListQuery, ProductListQuery},
    services::catalog_service,
    state::AppState,
};

pub fn farms_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_farms))
        .route("/{id}", get(get_farm))
}

pub fn products_router() -> Router<AppState> {
    Router::new().route("/", get(list_products))
}

pub fn packages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_packages))
        .route("/{id}", get(get_package))
}

#[utoipa::path(
    get,
    path = "/api/farms",
    responses((status = 200, description = "Farms, served from a short-lived cache", body = ApiResponse<FarmList>)),
    tag = "Catalog"
)]
pub async fn list_farms(State(state): State<AppState>) -> AppResult<Json<ApiResponse<FarmList>>> {
    Ok(Json(catalog_service::list_farms(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/farms/{id}",
    params(("id" = Uuid, Path, description = "Farm ID")),
    responses(
        (status = 200, description = "Farm with its products", body = ApiResponse<FarmDetail>),
        (status = 404, description = "Farm not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_farm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<FarmDetail>>> {
    Ok(Json(catalog_service::get_farm(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses((status = 200, description = "Products, served from a short-lived cache", body = ApiResponse<ProductList>)),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(catalog_service::list_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/packages",
    params(PackageListQuery),
    responses((status = 200, description = "Premade packages, served from a short-lived cache", body = ApiResponse<PackageList>)),
    tag = "Catalog"
)]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(query): Query<PackageListQuery>,
) -> AppResult<Json<ApiResponse<PackageList>>> {
    Ok(Json(catalog_service::list_packages(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/packages/{id}",
    params(("id" = Uuid, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Premade package", body = ApiResponse<PremadePackage>),
        (status = 404, description = "Package not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PremadePackage>>> {
    Ok(Json(catalog_service::get_package(&state, id).await?))
}

//! Read side for farms, products and premade packages.
//!
//! Listings go through the TTL cache. Detail lookups always hit the store.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, ActiveValue::NotSet,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cache::{PackageFilter, ProductFilter},
    dto::{
        catalog::{CreatePackageRequest, FarmDetail, FarmList, PackageList, ProductList},
        require,
    },
    entity::{
        farms::{Column as FarmCol, Model as FarmModel},
        premade_packages::{ActiveModel as PackageActive, Column as PackageCol},
        products::{Column as ProdCol, Model as ProductModel},
        Farms, PremadePackages, Products,
    },
    error::{AppError, AppResult},
    executor::QueryExecutor,
    middleware::auth::{AuthUser, ensure_farmer},
    models::{Cadence, Farm, PackageLine, PremadePackage, Product},
    pricing::money,
    response::{ApiResponse, Meta},
    routes::params::{PackageListQuery, ProductListQuery},
    services::convert::{farm_from_entity, package_from_entity, product_from_entity},
    state::AppState,
};

/// Catalog rows for `ids`, keyed by id. Unknown ids are simply absent.
pub async fn products_by_id(
    executor: &QueryExecutor,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, ProductModel>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let conn = executor.conn();
    let rows = executor
        .run("products.by_id", || {
            Products::find()
                .filter(ProdCol::Id.is_in(ids.iter().copied()))
                .all(conn)
        })
        .await?;
    Ok(rows.into_iter().map(|p| (p.id, p)).collect())
}

pub async fn find_package(executor: &QueryExecutor, id: Uuid) -> AppResult<Option<PremadePackage>> {
    let conn = executor.conn();
    executor
        .run("premade_packages.find", || {
            PremadePackages::find_by_id(id).one(conn)
        })
        .await?
        .map(package_from_entity)
        .transpose()
}

async fn find_farm(executor: &QueryExecutor, id: Uuid) -> AppResult<FarmModel> {
    let conn = executor.conn();
    executor
        .run("farms.find", || Farms::find_by_id(id).one(conn))
        .await?
        .ok_or_else(|| AppError::not_found("Farm"))
}

pub async fn list_farms(state: &AppState) -> AppResult<ApiResponse<FarmList>> {
    let executor = &state.executor;
    let items = state
        .cache
        .farms
        .get_or_load((), || async {
            let conn = executor.conn();
            let rows = executor
                .run("farms.list", || {
                    Farms::find().order_by_asc(FarmCol::Name).all(conn)
                })
                .await?;
            Ok::<_, AppError>(rows.into_iter().map(farm_from_entity).collect::<Vec<Farm>>())
        })
        .await?;

    let total = items.len();
    Ok(ApiResponse::listing("Farms", FarmList { items }, total))
}

pub async fn get_farm(state: &AppState, id: Uuid) -> AppResult<ApiResponse<FarmDetail>> {
    let farm = find_farm(&state.executor, id).await?;
    let conn = state.executor.conn();
    let products = state
        .executor
        .run("products.by_farm", || {
            Products::find()
                .filter(ProdCol::FarmId.eq(id))
                .order_by_asc(ProdCol::Name)
                .all(conn)
        })
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Farm",
        FarmDetail {
            farm: farm_from_entity(farm),
            products,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let key = ProductFilter {
        farm_id: query.farm_id,
    };
    let executor = &state.executor;
    let items = state
        .cache
        .products
        .get_or_load(key, || async {
            let conn = executor.conn();
            let rows = executor
                .run("products.list", || {
                    let mut finder = Products::find();
                    if let Some(farm_id) = key.farm_id {
                        finder = finder.filter(ProdCol::FarmId.eq(farm_id));
                    }
                    finder.order_by_asc(ProdCol::Name).all(conn)
                })
                .await?;
            Ok::<_, AppError>(
                rows.into_iter()
                    .map(product_from_entity)
                    .collect::<Vec<Product>>(),
            )
        })
        .await?;

    let total = items.len();
    Ok(ApiResponse::listing("Products", ProductList { items }, total))
}

pub async fn list_packages(
    state: &AppState,
    query: PackageListQuery,
) -> AppResult<ApiResponse<PackageList>> {
    let key = PackageFilter {
        farm_id: query.farm_id,
        cadence: query.cadence,
    };
    let executor = &state.executor;
    let items = state
        .cache
        .packages
        .get_or_load(key, || async {
            let conn = executor.conn();
            let rows = executor
                .run("premade_packages.list", || {
                    let mut finder = PremadePackages::find();
                    if let Some(farm_id) = key.farm_id {
                        finder = finder.filter(PackageCol::FarmId.eq(farm_id));
                    }
                    if let Some(cadence) = key.cadence {
                        finder = finder.filter(PackageCol::Cadence.eq(cadence.as_str()));
                    }
                    finder.order_by_desc(PackageCol::CreatedAt).all(conn)
                })
                .await?;
            rows.into_iter()
                .map(package_from_entity)
                .collect::<AppResult<Vec<PremadePackage>>>()
        })
        .await?;

    let total = items.len();
    Ok(ApiResponse::listing("Packages", PackageList { items }, total))
}

pub async fn get_package(state: &AppState, id: Uuid) -> AppResult<ApiResponse<PremadePackage>> {
    let package = find_package(&state.executor, id)
        .await?
        .ok_or_else(|| AppError::not_found("Package"))?;
    Ok(ApiResponse::success("Package", package, Some(Meta::empty())))
}

fn ensure_farm_owner(user: &AuthUser, farm: &FarmModel) -> AppResult<()> {
    if farm.owner_id != user.user_id {
        tracing::warn!(user_id = %user.user_id, farm_id = %farm.id, "farm ownership check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Listings keep serving the previous result until their TTL runs out.
pub async fn create_package(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePackageRequest,
) -> AppResult<ApiResponse<PremadePackage>> {
    ensure_farmer(user)?;
    payload.validate()?;

    let farm_id = require(payload.farm_id, "farm_id")?;
    let items = payload
        .items
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            Ok(PackageLine {
                name: require(line.name, &format!("items[{index}].name"))?
                    .trim()
                    .to_string(),
                quantity: line.quantity.trim().to_string(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let cadence = require(payload.cadence.as_deref().and_then(Cadence::parse), "cadence")?;

    let farm = find_farm(&state.executor, farm_id).await?;
    ensure_farm_owner(user, &farm)?;

    let items_json = serde_json::to_value(&items).map_err(anyhow::Error::from)?;
    let tags_json = serde_json::to_value(&payload.tags).map_err(anyhow::Error::from)?;

    let active = PackageActive {
        id: Set(Uuid::new_v4()),
        farm_id: Set(farm.id),
        name: Set(require(payload.name, "name")?.trim().to_string()),
        description: Set(payload.description),
        retail_value: Set(money(require(payload.retail_value, "retail_value")?)),
        cadence: Set(cadence.as_str().to_string()),
        items: Set(items_json),
        tags: Set(tags_json),
        created_at: NotSet,
    };
    let conn = state.executor.conn();
    let model = state
        .executor
        .run("premade_packages.insert", || active.clone().insert(conn))
        .await?;

    tracing::info!(package_id = %model.id, farm_id = %model.farm_id, "premade package created");
    Ok(ApiResponse::success(
        "Package created",
        package_from_entity(model)?,
        Some(Meta::empty()),
    ))
}

/// Subscriptions that referenced the package keep their own item snapshot.
pub async fn delete_package(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_farmer(user)?;

    let package = find_package(&state.executor, id)
        .await?
        .ok_or_else(|| AppError::not_found("Package"))?;
    let farm = find_farm(&state.executor, package.farm_id).await?;
    ensure_farm_owner(user, &farm)?;

    let conn = state.executor.conn();
    state
        .executor
        .run("premade_packages.delete", || {
            PremadePackages::delete_by_id(id).exec(conn)
        })
        .await?;

    tracing::info!(package_id = %id, farm_id = %farm.id, "premade package deleted");
    Ok(ApiResponse::success(
        "Package deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

use axum::Router;

use crate::state::AppState;

pub mod catalog;
pub mod doc;
pub mod farmer;
pub mod health;
pub mod orders;
pub mod params;
pub mod subscriptions;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/farms", catalog::farms_router())
        .nest("/products", catalog::products_router())
        .nest("/packages", catalog::packages_router())
        .nest("/farmer", farmer::router())
}

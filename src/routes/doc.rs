use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        catalog::{
            CreatePackageRequest, FarmDetail, FarmList, PackageLineInput, PackageList, ProductList,
        },
        orders::{
            CreateOrderRequest, CreateOrderResponse, DeliveryAddressInput, OrderItemInput,
            OrderList, OrderWithItems,
        },
        subscriptions::{
            CreateSubscriptionRequest, CreateSubscriptionResponse, RedriveNotificationRequest,
            RedriveNotificationResponse, SubscriptionDetail, SubscriptionItemInput,
            SubscriptionList,
        },
    },
    error::ErrorData,
    models::{
        Cadence, DeliveryDetail, Farm, NotificationKind, Order, OrderItem, OrderStatus,
        PackageLine, PackageType, PremadePackage, Product, Subscription, SubscriptionItem,
        SubscriptionStatus,
    },
    pricing::{PricedItem, PricingSummary},
    response::{ApiResponse, Meta},
    routes::{catalog, farmer, health, orders, params, subscriptions},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        subscriptions::create_subscription,
        subscriptions::list_subscriptions,
        subscriptions::get_subscription,
        subscriptions::redrive_notification,
        catalog::list_farms,
        catalog::get_farm,
        catalog::list_products,
        catalog::list_packages,
        catalog::get_package,
        farmer::create_package,
        farmer::delete_package,
        farmer::list_orders
    ),
    components(
        schemas(
            Cadence,
            PackageType,
            OrderStatus,
            SubscriptionStatus,
            NotificationKind,
            Farm,
            Product,
            PackageLine,
            PremadePackage,
            Order,
            OrderItem,
            Subscription,
            DeliveryDetail,
            SubscriptionItem,
            PricedItem,
            PricingSummary,
            DeliveryAddressInput,
            OrderItemInput,
            CreateOrderRequest,
            CreateOrderResponse,
            OrderList,
            OrderWithItems,
            SubscriptionItemInput,
            CreateSubscriptionRequest,
            CreateSubscriptionResponse,
            SubscriptionDetail,
            SubscriptionList,
            RedriveNotificationRequest,
            RedriveNotificationResponse,
            PackageLineInput,
            CreatePackageRequest,
            FarmList,
            FarmDetail,
            ProductList,
            PackageList,
            ErrorData,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<ErrorData>,
            ApiResponse<OrderList>,
            ApiResponse<SubscriptionDetail>,
            ApiResponse<PackageList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "One-off orders"),
        (name = "Subscriptions", description = "Recurring delivery subscriptions"),
        (name = "Catalog", description = "Farms, products and premade packages"),
        (name = "Farmer", description = "Farmer package management and incoming orders"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/health/ready",
            "/api/orders",
            "/api/orders/{id}",
            "/api/subscriptions",
            "/api/subscriptions/{id}",
            "/api/subscriptions/{id}/notifications",
            "/api/farms",
            "/api/farms/{id}",
            "/api/products",
            "/api/packages",
            "/api/packages/{id}",
            "/api/farmer/packages",
            "/api/farmer/packages/{id}",
            "/api/farmer/orders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} is not documented");
        }
    }
}

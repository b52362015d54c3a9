#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use farmshare_api::{
    config::{AppConfig, DbConfig, NotifierConfig},
    db::{create_orm_conn, run_migrations},
    entity::{
        farms::ActiveModel as FarmActive, premade_packages::ActiveModel as PackageActive,
        products::ActiveModel as ProductActive, users::ActiveModel as UserActive,
    },
    executor::RetryPolicy,
    middleware::auth::AuthUser,
    models::{Cadence, Role},
    notifications::{LogNotifier, Notifier},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

/// Integration tests run against Postgres only when a URL is configured.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        db: DbConfig::default(),
        retry: RetryPolicy::default(),
        listing_cache_ttl: Duration::from_secs(60),
        notifier: NotifierConfig {
            url: None,
            api_key: None,
            from: "test@farmshare.local".into(),
            timeout: Duration::from_secs(5),
        },
    }
}

pub async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    setup_state_with(database_url, Arc::new(LogNotifier)).await
}

pub async fn setup_state_with(
    database_url: &str,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<AppState> {
    let config = test_config(database_url);
    let orm = create_orm_conn(database_url, &config.db).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, &config, notifier))
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        first_name: Set(Some("Test".into())),
        last_name: Set(Some("User".into())),
        phone: Set(None),
        role: Set(role.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn create_farm(state: &AppState, owner: &AuthUser) -> anyhow::Result<Uuid> {
    let farm = FarmActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.user_id),
        name: Set(format!("Farm {}", Uuid::new_v4().simple())),
        description: Set(None),
        location: Set(Some("Yorkshire".into())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(farm.id)
}

pub async fn create_product(
    state: &AppState,
    farm_id: Uuid,
    name: &str,
    price: &str,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        farm_id: Set(farm_id),
        name: Set(name.to_string()),
        description: Set(None),
        price: Set(dec(price)),
        unit: Set("kg".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

pub async fn create_package(
    state: &AppState,
    farm_id: Uuid,
    retail_value: &str,
) -> anyhow::Result<Uuid> {
    let package = PackageActive {
        id: Set(Uuid::new_v4()),
        farm_id: Set(farm_id),
        name: Set("Veg Box".into()),
        description: Set(Some("Seasonal vegetables".into())),
        retail_value: Set(dec(retail_value)),
        cadence: Set(Cadence::Weekly.as_str().to_string()),
        items: Set(serde_json::json!([
            { "name": "Carrots", "quantity": "2 kg" },
            { "name": "Potatoes", "quantity": "3 kg" }
        ])),
        tags: Set(serde_json::json!(["seasonal"])),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(package.id)
}

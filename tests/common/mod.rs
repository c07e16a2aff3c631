#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use buylando_api::{
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{
        categories::ActiveModel as CategoryActive, products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    middleware::auth::{AuthUser, Role, TokenKeys},
    notifications::{InMemoryScheduler, NotificationScheduler},
    order_policy::OrderPolicy,
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Database for integration tests, `None` when the environment has none.
pub fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            None
        }
    }
}

pub fn test_keys() -> TokenKeys {
    TokenKeys::new(
        TEST_SECRET,
        chrono::Duration::minutes(5),
        chrono::Duration::hours(1),
    )
}

pub async fn setup_state(
    database_url: &str,
    scheduler: Arc<dyn NotificationScheduler>,
) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;
    Ok(AppState::new(pool, scheduler, test_keys(), OrderPolicy::default()))
}

pub async fn setup_with_memory_scheduler(
    database_url: &str,
) -> anyhow::Result<(AppState, InMemoryScheduler)> {
    let scheduler = InMemoryScheduler::new();
    let state = setup_state(database_url, Arc::new(scheduler.clone())).await?;
    Ok((state, scheduler))
}

/// Short random suffix so tests sharing one database never collide.
pub fn unique(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..12])
}

pub fn price(value: &str) -> Decimal {
    Decimal::from_str(value).expect("valid decimal literal")
}

pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", unique(role.as_str()))),
        password_hash: Set("not-a-real-hash".into()),
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

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    unit_price: &str,
    category_id: Uuid,
) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(Some(format!("{name} description"))),
        price: Set(price(unit_price)),
        category_id: Set(category_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product.id)
}

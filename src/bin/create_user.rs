//! Create an account or change the role of an existing one.
//!
//! Usage: `create_user <email> <password> <customer|seller>`

use anyhow::{Context, bail};
use buylando_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    middleware::auth::Role,
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(email), Some(password), Some(role)) = (args.next(), args.next(), args.next()) else {
        bail!("usage: create_user <email> <password> <customer|seller>");
    };
    let role = Role::parse(&role).with_context(|| format!("unknown role {role}"))?;
    let email = email.trim().to_lowercase();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let password_hash = hash_password(&password)?;
    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
            SET role = EXCLUDED.role, password_hash = EXCLUDED.password_hash
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(&pool)
    .await?;

    tracing::info!(user_id = %user_id, email = %email, role = role.as_str(), "user ensured");
    Ok(())
}

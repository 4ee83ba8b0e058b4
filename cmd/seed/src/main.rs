//! One-shot bootstrap: makes sure the initial admin account exists.
//!
//! Reads `AGORA_DATABASE__URL`, `AGORA_ADMIN_USERNAME` (default "admin")
//! and `AGORA_ADMIN_PASSWORD` from the environment, then upserts the
//! account at admin role. Safe to re-run; the password is re-hashed each
//! time.

use anyhow::{bail, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("AGORA_DATABASE__URL").context("AGORA_DATABASE__URL must be set")?;
    let username = std::env::var("AGORA_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password =
        std::env::var("AGORA_ADMIN_PASSWORD").context("AGORA_ADMIN_PASSWORD must be set")?;
    if password.len() < 8 {
        bail!("admin password must be at least 8 characters long");
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connecting to postgres")?;

    let password_hash = auth_adapters::hash_password(&password)?;

    sqlx::query(
        "INSERT INTO users (user_id, username, password_hash, role) \
         VALUES ($1, $2, $3, 2) \
         ON CONFLICT (username) \
         DO UPDATE SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role",
    )
    .bind(uuid::Uuid::now_v7())
    .bind(&username)
    .bind(&password_hash)
    .execute(&pool)
    .await
    .context("upserting admin account")?;

    println!("admin account '{username}' is ready");
    Ok(())
}

//! # PostgreSQL adapters
//!
//! Implements the `domains` ports on sqlx/PostgreSQL. Every ledger
//! transition runs inside one transaction so the interaction row and its
//! counter delta commit together; the counter update itself is a single
//! `jsonb_set` UPDATE, so the row lock it takes serializes concurrent
//! writers on the same target without blocking other targets.

pub mod categories;
pub mod comments;
pub mod interactions;
pub mod stats;
pub mod threads;
pub mod users;

pub use categories::PgCategoryRepo;
pub use comments::PgCommentRepo;
pub use interactions::PgInteractionRepo;
pub use threads::PgThreadRepo;
pub use users::PgUserRepo;

use sqlx::postgres::{PgPool, PgPoolOptions};

use domains::DomainError;

/// Embedded migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Connects a pool and brings the schema up to date.
pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;
    tracing::info!("running database migrations");
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// Maps storage failures onto the domain taxonomy. Unique violations are
/// the storage-level face of an occupied slot or taken name; everything
/// else is an internal failure that must be logged upstream.
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            DomainError::conflict(match db.constraint() {
                Some("users_username_key") => "username already exists".to_string(),
                Some("uniq_thread_vote") | Some("uniq_comment_vote") => {
                    "user has already voted on this target".to_string()
                }
                Some("uniq_thread_follow") => "already following this thread".to_string(),
                Some(other) => format!("duplicate value ({other})"),
                None => "duplicate value".to_string(),
            })
        }
        _ => DomainError::internal(err),
    }
}

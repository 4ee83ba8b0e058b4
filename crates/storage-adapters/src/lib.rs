//! # storage-adapters
//!
//! Database implementations of the `domains` ports. PostgreSQL (behind the
//! `db-postgres` feature) is the only backend currently built.

#[cfg(feature = "db-postgres")]
pub mod postgres;

#[cfg(feature = "db-postgres")]
pub use postgres::{
    connect, PgCategoryRepo, PgCommentRepo, PgInteractionRepo, PgThreadRepo, PgUserRepo,
};

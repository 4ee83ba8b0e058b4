//! Category rows.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{Category, CategoryRepo, Result};

use super::map_sqlx_err;

pub struct PgCategoryRepo {
    pool: PgPool,
}

impl PgCategoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_category(row: &sqlx::postgres::PgRow) -> Category {
    Category {
        id: row.get("category_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CategoryRepo for PgCategoryRepo {
    async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT category_id, name, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(row_to_category).collect())
    }

    async fn create(&self, name: &str) -> Result<Category> {
        let category = Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO categories (category_id, name, created_at) VALUES ($1, $2, $3)")
            .bind(category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(category)
    }
}

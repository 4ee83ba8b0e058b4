//! Thread rows. Stats blocks are created zeroed by the schema default and
//! only ever move through the stats aggregator afterwards.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{DomainError, NewThread, Result, Thread, ThreadRepo, ThreadStats};

use super::map_sqlx_err;

pub struct PgThreadRepo {
    pool: PgPool,
}

impl PgThreadRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_thread(row: &sqlx::postgres::PgRow) -> Thread {
    Thread {
        id: row.get("thread_id"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        title: row.get("title"),
        content: row.get("content"),
        stats: row.get("stats"),
        tags: row.get("tags"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        is_deleted: row.get("is_deleted"),
    }
}

const THREAD_COLUMNS: &str = "thread_id, author_id, category_id, title, content, stats, tags, \
                              created_at, updated_at, is_deleted";

#[async_trait]
impl ThreadRepo for PgThreadRepo {
    async fn create(&self, new_thread: NewThread) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::now_v7(),
            author_id: new_thread.author_id,
            category_id: new_thread.category_id,
            title: new_thread.title,
            content: new_thread.content,
            stats: ThreadStats::default().to_value(),
            tags: new_thread.tags,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };

        sqlx::query(
            "INSERT INTO threads \
             (thread_id, author_id, category_id, title, content, stats, tags, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(thread.id)
        .bind(thread.author_id)
        .bind(thread.category_id)
        .bind(&thread.title)
        .bind(&thread.content)
        .bind(&thread.stats)
        .bind(&thread.tags)
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(thread)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(row.as_ref().map(row_to_thread))
    }

    async fn list_by_category(
        &self,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads \
             WHERE category_id = $1 AND is_deleted = FALSE \
             ORDER BY updated_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(row_to_thread).collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads \
             WHERE author_id = $1 AND is_deleted = FALSE"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(row_to_thread).collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE threads SET is_deleted = TRUE, updated_at = $2 WHERE thread_id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("thread"));
        }
        Ok(())
    }

    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE threads SET is_deleted = TRUE, updated_at = $2 \
             WHERE author_id = $1 AND is_deleted = FALSE",
        )
        .bind(author_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }
}

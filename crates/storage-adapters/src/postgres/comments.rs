//! Comment rows.
//!
//! A comment is also a counter event on its thread: creation and deletion
//! adjust the thread's `comments` field through the same aggregator
//! primitive the ledger uses, inside the same transaction as the row write.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{
    Comment, CommentRepo, CommentStats, DomainError, NewComment, Result, StatField, TargetRef,
};

use super::{map_sqlx_err, stats};

pub struct PgCommentRepo {
    pool: PgPool,
}

impl PgCommentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_comment(row: &sqlx::postgres::PgRow) -> Comment {
    Comment {
        id: row.get("comment_id"),
        thread_id: row.get("thread_id"),
        author_id: row.get("author_id"),
        parent_comment_id: row.get("parent_comment_id"),
        content: row.get("content"),
        stats: row.get("stats"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        is_deleted: row.get("is_deleted"),
    }
}

const COMMENT_COLUMNS: &str = "comment_id, thread_id, author_id, parent_comment_id, content, \
                               stats, created_at, updated_at, is_deleted";

#[async_trait]
impl CommentRepo for PgCommentRepo {
    async fn create_with_stats(&self, new_comment: NewComment) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::now_v7(),
            thread_id: new_comment.thread_id,
            author_id: new_comment.author_id,
            parent_comment_id: new_comment.parent_comment_id,
            content: new_comment.content,
            stats: CommentStats::default().to_value(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query(
            "INSERT INTO comments \
             (comment_id, thread_id, author_id, parent_comment_id, content, stats, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(comment.id)
        .bind(comment.thread_id)
        .bind(comment.author_id)
        .bind(comment.parent_comment_id)
        .bind(&comment.content)
        .bind(&comment.stats)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        stats::adjust(&mut *tx, TargetRef::Thread(comment.thread_id), StatField::Comments, 1)
            .await?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = $1 AND is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(row.as_ref().map(row_to_comment))
    }

    async fn list_by_thread(
        &self,
        thread_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE thread_id = $1 AND is_deleted = FALSE \
             ORDER BY created_at LIMIT $2 OFFSET $3"
        ))
        .bind(thread_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments \
             WHERE author_id = $1 AND is_deleted = FALSE"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    async fn soft_delete_with_stats(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let row = sqlx::query(
            "UPDATE comments SET is_deleted = TRUE, updated_at = $2 \
             WHERE comment_id = $1 AND is_deleted = FALSE \
             RETURNING thread_id",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = row else {
            return Err(DomainError::not_found("comment"));
        };
        let thread_id: Uuid = row.get("thread_id");

        stats::adjust(&mut *tx, TargetRef::Thread(thread_id), StatField::Comments, -1).await?;

        tx.commit().await.map_err(map_sqlx_err)
    }

    /// Bulk retraction on ban: flips every live comment of the author and
    /// walks the affected threads' `comments` counters down by the exact
    /// number retracted from each, in one statement.
    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()> {
        sqlx::query(
            "WITH retracted AS ( \
                 UPDATE comments SET is_deleted = TRUE, updated_at = now() \
                 WHERE author_id = $1 AND is_deleted = FALSE \
                 RETURNING thread_id \
             ), per_thread AS ( \
                 SELECT thread_id, COUNT(*) AS n FROM retracted GROUP BY thread_id \
             ) \
             UPDATE threads t \
             SET stats = jsonb_set(t.stats, '{comments}', \
                 to_jsonb((t.stats->>'comments')::bigint - per_thread.n)) \
             FROM per_thread \
             WHERE t.thread_id = per_thread.thread_id",
        )
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }
}

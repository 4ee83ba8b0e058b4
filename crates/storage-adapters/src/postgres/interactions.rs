//! # Interaction ledger rows
//!
//! Each port method here is one transaction. The occupancy check on create
//! runs inside that transaction and the partial unique indexes back it up,
//! so a racing duplicate loses as a `Conflict` instead of slipping in
//! between check and insert.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{
    DomainError, Interaction, InteractionKind, InteractionRepo, NewInteraction, Result, TargetRef,
};

use super::{map_sqlx_err, stats};

pub struct PgInteractionRepo {
    pool: PgPool,
}

impl PgInteractionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_interaction(row: &sqlx::postgres::PgRow) -> Result<Interaction> {
    let target = TargetRef::from_parts(row.get("thread_id"), row.get("comment_id"))
        .map_err(|_| DomainError::internal("interaction row with malformed target"))?;
    Ok(Interaction {
        id: row.get("interaction_id"),
        user_id: row.get("user_id"),
        target,
        kind: InteractionKind::parse(row.get::<&str, _>("interaction_type"))?,
        created_at: row.get("created_at"),
    })
}

/// Column the target id lives in, for composing lookups.
fn target_column(target: TargetRef) -> (&'static str, Uuid) {
    match target {
        TargetRef::Thread(id) => ("thread_id", id),
        TargetRef::Comment(id) => ("comment_id", id),
    }
}

#[async_trait]
impl InteractionRepo for PgInteractionRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Interaction>> {
        let row = sqlx::query(
            "SELECT interaction_id, user_id, thread_id, comment_id, interaction_type, created_at \
             FROM interactions WHERE interaction_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.as_ref().map(row_to_interaction).transpose()
    }

    async fn list_for_target(
        &self,
        user_id: Uuid,
        target: TargetRef,
    ) -> Result<Vec<Interaction>> {
        let (column, target_id) = target_column(target);
        let sql = format!(
            "SELECT interaction_id, user_id, thread_id, comment_id, interaction_type, created_at \
             FROM interactions WHERE user_id = $1 AND {column} = $2 ORDER BY created_at",
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(target_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        rows.iter().map(row_to_interaction).collect()
    }

    /// Inserts the ledger row and bumps the matching counter.
    ///
    /// The slot query, the insert and the counter delta share one
    /// transaction; none of the three is ever visible without the others.
    async fn create_with_stats(&self, new_interaction: NewInteraction) -> Result<Interaction> {
        let NewInteraction { user_id, target, kind } = new_interaction;
        let (column, target_id) = target_column(target);

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // Occupancy: votes compete for one slot, follows for another.
        let occupant_sql = format!(
            "SELECT interaction_type FROM interactions \
             WHERE user_id = $1 AND {column} = $2 AND interaction_type = ANY($3)",
        );
        let competing: Vec<String> = if kind.is_vote() {
            vec!["upvote".into(), "downvote".into()]
        } else {
            vec!["follow".into()]
        };
        let occupant = sqlx::query(&occupant_sql)
            .bind(user_id)
            .bind(target_id)
            .bind(&competing)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        if occupant.is_some() {
            return Err(DomainError::conflict(if kind.is_vote() {
                "user has already voted on this target"
            } else {
                "already following this thread"
            }));
        }

        let interaction = Interaction {
            id: Uuid::now_v7(),
            user_id,
            target,
            kind,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO interactions \
             (interaction_id, user_id, thread_id, comment_id, interaction_type, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(interaction.id)
        .bind(interaction.user_id)
        .bind(target.thread_id())
        .bind(target.comment_id())
        .bind(kind.as_str())
        .bind(interaction.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        stats::adjust(&mut *tx, target, kind.stat_field(), 1).await?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(interaction)
    }

    async fn remove_with_stats(&self, interaction: &Interaction) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // The kind guard drops the delete if a concurrent switch got there
        // first; the counter delta must match what actually left the table.
        let deleted = sqlx::query(
            "DELETE FROM interactions WHERE interaction_id = $1 AND interaction_type = $2",
        )
        .bind(interaction.id)
        .bind(interaction.kind.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        if deleted.rows_affected() == 0 {
            return Err(DomainError::not_found("interaction"));
        }

        stats::adjust(&mut *tx, interaction.target, interaction.kind.stat_field(), -1).await?;

        tx.commit().await.map_err(map_sqlx_err)
    }

    async fn switch_vote_with_stats(
        &self,
        interaction: &Interaction,
        new_kind: InteractionKind,
    ) -> Result<Interaction> {
        debug_assert!(interaction.kind.is_vote() && new_kind.is_vote());

        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let updated = sqlx::query(
            "UPDATE interactions SET interaction_type = $2 \
             WHERE interaction_id = $1 AND interaction_type = $3",
        )
        .bind(interaction.id)
        .bind(new_kind.as_str())
        .bind(interaction.kind.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        if updated.rows_affected() == 0 {
            return Err(DomainError::not_found("interaction"));
        }

        // Move exactly one unit between the two vote counters.
        stats::adjust(&mut *tx, interaction.target, interaction.kind.stat_field(), -1).await?;
        stats::adjust(&mut *tx, interaction.target, new_kind.stat_field(), 1).await?;

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(Interaction { kind: new_kind, ..interaction.clone() })
    }
}

//! Atomic counter maintenance on embedded stats blocks.
//!
//! The whole aggregator is one UPDATE per delta: read-modify-write happens
//! inside the database, under the target row's lock, on the caller's
//! transaction. Two concurrent `+1`s on the same target serialize there;
//! deltas on different targets never contend.

use sqlx::PgConnection;

use domains::{DomainError, Result, StatField, TargetRef};

use super::map_sqlx_err;

/// Applies `delta` to one counter of the target's stats block.
///
/// The field name is interpolated from the closed [`StatField`] enum
/// (request input never reaches the SQL text) and the delta is bound as a
/// parameter. Affecting zero rows means the target does not exist.
pub(crate) async fn adjust(
    conn: &mut PgConnection,
    target: TargetRef,
    field: StatField,
    delta: i64,
) -> Result<()> {
    debug_assert!(field.allowed_on(target.kind()), "field not valid for target kind");

    let (sql, id, entity) = match target {
        TargetRef::Thread(id) => (
            format!(
                "UPDATE threads \
                 SET stats = jsonb_set(stats, '{{{field}}}', \
                     to_jsonb((stats->>'{field}')::bigint + $2)) \
                 WHERE thread_id = $1",
                field = field.as_str()
            ),
            id,
            "thread",
        ),
        TargetRef::Comment(id) => (
            format!(
                "UPDATE comments \
                 SET stats = jsonb_set(stats, '{{{field}}}', \
                     to_jsonb((stats->>'{field}')::bigint + $2)) \
                 WHERE comment_id = $1",
                field = field.as_str()
            ),
            id,
            "comment",
        ),
    };

    let result = sqlx::query(&sql)
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await
        .map_err(map_sqlx_err)?;

    if result.rows_affected() == 0 {
        return Err(DomainError::not_found(entity));
    }
    Ok(())
}

//! Account rows.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use domains::{DomainError, NewUser, Result, Role, User, UserRepo};

use super::map_sqlx_err;

pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User> {
    Ok(User {
        id: row.get("user_id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: Role::from_i16(row.get("role"))
            .map_err(|_| DomainError::internal("user row with unknown role level"))?,
        reputation: row.get("reputation"),
        is_banned: row.get("is_banned"),
        created_at: row.get("created_at"),
    })
}

const USER_COLUMNS: &str =
    "user_id, username, password_hash, role, reputation, is_banned, created_at";

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::now_v7(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            role: Role::User,
            reputation: 0,
            is_banned: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_i16())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.update_field("UPDATE users SET password_hash = $2 WHERE user_id = $1", id, password_hash)
            .await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        self.update_field("UPDATE users SET role = $2 WHERE user_id = $1", id, role.as_i16())
            .await
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<()> {
        self.update_field("UPDATE users SET is_banned = $2 WHERE user_id = $1", id, banned)
            .await
    }

    async fn set_reputation(&self, id: Uuid, reputation: i64) -> Result<()> {
        self.update_field("UPDATE users SET reputation = $2 WHERE user_id = $1", id, reputation)
            .await
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT user_id FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(rows.iter().map(|row| row.get("user_id")).collect())
    }
}

impl PgUserRepo {
    /// Single-column updates share their shape; affecting zero rows means
    /// the account does not exist.
    async fn update_field<'q, T>(&self, sql: &'q str, id: Uuid, value: T) -> Result<()>
    where
        T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres> + Send + 'q,
    {
        let result = sqlx::query(sql)
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user"));
        }
        Ok(())
    }
}

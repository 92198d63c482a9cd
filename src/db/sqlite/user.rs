//! SQLite UserRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::database_error;
use crate::db::utils::{current_timestamp, generate_token_key, hash_token_key};
use crate::db::{DbError, DbResult, Id, NewUser, User, UserRepository};

/// SQLx-backed user repository.
pub struct SqliteUserRepository {
    pub(crate) pool: SqlitePool,
}

const USER_COLUMNS: &str = "id, email, first_name, last_name, is_active, date_joined";

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> DbResult<User> {
        let email = user.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(DbError::Validation {
                message: "Users must have an email address".to_string(),
            });
        }

        let date_joined = current_timestamp();

        let result = sqlx::query(
            "INSERT INTO user_account (email, first_name, last_name, is_active, date_joined) \
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(&email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&date_joined)
        .execute(&self.pool)
        .await
        .map_err(|e| match database_error(e) {
            DbError::Constraint { .. } => DbError::AlreadyExists {
                entity_type: "User".to_string(),
                id: email.clone(),
            },
            other => other,
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            email,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_active: true,
            date_joined,
        })
    }

    async fn get(&self, id: Id) -> DbResult<User> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_account WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(row_to_user)
            .ok_or_else(|| DbError::not_found("User", id))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_account WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn issue_token(&self, user_id: Id) -> DbResult<String> {
        let key = generate_token_key();

        sqlx::query("INSERT INTO auth_token (user_id, key_hash, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(hash_token_key(&key))
            .bind(current_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| match database_error(e) {
                // user_id does not reference an existing user
                DbError::Constraint { .. } => DbError::not_found("User", user_id),
                other => other,
            })?;

        Ok(key)
    }

    async fn find_by_token(&self, key: &str) -> DbResult<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.email, u.first_name, u.last_name, u.is_active, u.date_joined \
             FROM auth_token t JOIN user_account u ON u.id = t.user_id \
             WHERE t.key_hash = ?",
        )
        .bind(hash_token_key(key))
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(row.as_ref().map(row_to_user))
    }
}

pub(super) fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    }
}

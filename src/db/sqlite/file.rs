//! SQLite CardFileRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::{database_error, expect_affected};
use crate::db::utils::current_timestamp;
use crate::db::{CardFile, CardFileRepository, DbError, DbResult, Id};

/// SQLx-backed card file repository.
pub struct SqliteCardFileRepository {
    pub(crate) pool: SqlitePool,
}

impl CardFileRepository for SqliteCardFileRepository {
    async fn create(&self, file: &CardFile) -> DbResult<CardFile> {
        let created_on = current_timestamp();

        let result = sqlx::query(
            "INSERT INTO card_file (card_id, file, name, content_type, size, created_on) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file.card_id)
        .bind(&file.file)
        .bind(&file.name)
        .bind(&file.content_type)
        .bind(file.size)
        .bind(&created_on)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(CardFile {
            id: result.last_insert_rowid(),
            created_on,
            ..file.clone()
        })
    }

    async fn get(&self, id: Id) -> DbResult<CardFile> {
        let row = sqlx::query(
            "SELECT id, card_id, file, name, content_type, size, created_on \
             FROM card_file WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(row_to_file)
            .ok_or_else(|| DbError::not_found("CardFile", id))
    }

    async fn list_by_card(&self, card_id: Id) -> DbResult<Vec<CardFile>> {
        let rows = sqlx::query(
            "SELECT id, card_id, file, name, content_type, size, created_on \
             FROM card_file WHERE card_id = ? ORDER BY id",
        )
        .bind(card_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_file).collect())
    }

    async fn list_by_column(&self, column_id: Id) -> DbResult<Vec<CardFile>> {
        self.list_where(
            "card_id IN (SELECT id FROM card WHERE column_id = ?)",
            column_id,
        )
        .await
    }

    async fn list_by_board(&self, board_id: Id) -> DbResult<Vec<CardFile>> {
        self.list_where(
            "card_id IN (SELECT c.id FROM card c \
             JOIN board_column bc ON bc.id = c.column_id WHERE bc.board_id = ?)",
            board_id,
        )
        .await
    }

    async fn list_by_project(&self, project_id: Id) -> DbResult<Vec<CardFile>> {
        self.list_where(
            "card_id IN (SELECT c.id FROM card c \
             JOIN board_column bc ON bc.id = c.column_id \
             JOIN board b ON b.id = bc.board_id WHERE b.project_id = ?)",
            project_id,
        )
        .await
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM card_file WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "CardFile", id)
    }
}

impl SqliteCardFileRepository {
    async fn list_where(&self, filter: &str, id: Id) -> DbResult<Vec<CardFile>> {
        let sql = format!(
            "SELECT id, card_id, file, name, content_type, size, created_on \
             FROM card_file WHERE {} ORDER BY id",
            filter
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(rows.iter().map(row_to_file).collect())
    }
}

pub(super) fn row_to_file(row: &sqlx::sqlite::SqliteRow) -> CardFile {
    CardFile {
        id: row.get("id"),
        card_id: row.get("card_id"),
        file: row.get("file"),
        name: row.get("name"),
        content_type: row.get("content_type"),
        size: row.get("size"),
        created_on: row.get("created_on"),
    }
}

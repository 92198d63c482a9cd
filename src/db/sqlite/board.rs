//! SQLite BoardRepository implementation.

use sqlx::{Row, SqlitePool};

use super::column::{ColumnScope, fetch_column_details};
use super::helpers::{database_error, expect_affected};
use super::user::row_to_user;
use crate::db::utils::current_timestamp;
use crate::db::{
    Board, BoardAccess, BoardDetail, BoardRepository, DbError, DbResult, Id, LastSeen, User,
};

/// SQLx-backed board repository.
pub struct SqliteBoardRepository {
    pub(crate) pool: SqlitePool,
}

const BOARD_COLUMNS: &str =
    "b.id, b.project_id, b.title, b.background_img, b.is_archived, b.created_on, b.last_modified";

/// Next value of the last-seen sequence, shared by all users.
const NEXT_SEEN_SEQ: &str = "(SELECT COALESCE(MAX(seq), 0) + 1 FROM board_last_seen)";

impl BoardRepository for SqliteBoardRepository {
    async fn create(&self, board: &Board, creator_id: Id) -> DbResult<Board> {
        let created_on = current_timestamp();

        // Board, creator membership and last-seen row land together or not at all
        let mut tx = self.pool.begin().await.map_err(|e| DbError::Database {
            message: format!("Failed to begin transaction: {}", e),
        })?;

        let result = sqlx::query(
            "INSERT INTO board (project_id, title, background_img, is_archived, created_on, last_modified) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(board.project_id)
        .bind(&board.title)
        .bind(&board.background_img)
        .bind(board.is_archived)
        .bind(&created_on)
        .bind(&created_on)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        let id = result.last_insert_rowid();

        sqlx::query("INSERT INTO board_member (board_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

        sqlx::query(&format!(
            "INSERT INTO board_last_seen (board_id, user_id, timestamp, seq) VALUES (?, ?, ?, {})",
            NEXT_SEEN_SEQ
        ))
        .bind(id)
        .bind(creator_id)
        .bind(&created_on)
        .execute(&mut *tx)
        .await
        .map_err(database_error)?;

        tx.commit().await.map_err(|e| DbError::Database {
            message: format!("Failed to commit: {}", e),
        })?;

        Ok(Board {
            id,
            project_id: board.project_id,
            title: board.title.clone(),
            background_img: board.background_img.clone(),
            is_archived: board.is_archived,
            created_on: created_on.clone(),
            last_modified: created_on,
        })
    }

    async fn get(&self, id: Id) -> DbResult<Board> {
        let row = sqlx::query(&format!("SELECT {} FROM board b WHERE b.id = ?", BOARD_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.as_ref()
            .map(row_to_board)
            .ok_or_else(|| DbError::not_found("Board", id))
    }

    async fn get_detail(&self, id: Id) -> DbResult<BoardDetail> {
        let board = self.get(id).await?;
        let columns = fetch_column_details(&self.pool, ColumnScope::Board(id)).await?;
        let members = self.members(id).await?;

        Ok(BoardDetail {
            board,
            columns,
            members,
        })
    }

    async fn list_by_project(&self, project_id: Id) -> DbResult<Vec<Board>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM board b WHERE b.project_id = ? ORDER BY b.id",
            BOARD_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_board).collect())
    }

    async fn list_for_member(&self, user_id: Id, is_archived: Option<bool>) -> DbResult<Vec<Board>> {
        let archived_clause = if is_archived.is_some() {
            "AND b.is_archived = ?"
        } else {
            ""
        };

        let sql = format!(
            "SELECT {} FROM board_member m JOIN board b ON b.id = m.board_id \
             WHERE m.user_id = ? {} ORDER BY m.id",
            BOARD_COLUMNS, archived_clause
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        if let Some(archived) = is_archived {
            query = query.bind(archived);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(rows.iter().map(row_to_board).collect())
    }

    async fn update(&self, board: &Board) -> DbResult<Board> {
        let last_modified = current_timestamp();

        let result = sqlx::query(
            "UPDATE board SET title = ?, background_img = ?, is_archived = ?, last_modified = ? \
             WHERE id = ?",
        )
        .bind(&board.title)
        .bind(&board.background_img)
        .bind(board.is_archived)
        .bind(&last_modified)
        .bind(board.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_affected(result, "Board", board.id)?;

        Ok(Board {
            last_modified,
            ..board.clone()
        })
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM board WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Board", id)
    }

    async fn access(&self, board_id: Id, user_id: Id) -> DbResult<BoardAccess> {
        let row = sqlx::query(
            "SELECT b.id AS board_id, p.owner_id AS owner_id, \
                    EXISTS(SELECT 1 FROM board_member m WHERE m.board_id = b.id AND m.user_id = ?) AS is_member \
             FROM board b JOIN project p ON p.id = b.project_id \
             WHERE b.id = ?",
        )
        .bind(user_id)
        .bind(board_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        let row = row.ok_or_else(|| DbError::not_found("Board", board_id))?;

        Ok(BoardAccess {
            board_id: row.get("board_id"),
            owner_id: row.get("owner_id"),
            is_member: row.get("is_member"),
        })
    }

    async fn add_member(&self, board_id: Id, user_id: Id) -> DbResult<()> {
        sqlx::query("INSERT INTO board_member (board_id, user_id) VALUES (?, ?)")
            .bind(board_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match database_error(e) {
                DbError::Constraint { .. } => DbError::AlreadyExists {
                    entity_type: "BoardMember".to_string(),
                    id: format!("{}:{}", board_id, user_id),
                },
                other => other,
            })?;

        Ok(())
    }

    async fn members(&self, board_id: Id) -> DbResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT u.id, u.email, u.first_name, u.last_name, u.is_active, u.date_joined \
             FROM board_member m JOIN user_account u ON u.id = m.user_id \
             WHERE m.board_id = ? ORDER BY m.id",
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn add_favourite(&self, board_id: Id, user_id: Id) -> DbResult<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO board_favourite (board_id, user_id) VALUES (?, ?)")
                .bind(board_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_favourite(&self, board_id: Id, user_id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM board_favourite WHERE board_id = ? AND user_id = ?")
            .bind(board_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "BoardFavourite", board_id)
    }

    async fn list_favourites(&self, user_id: Id) -> DbResult<Vec<Board>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM board_favourite f JOIN board b ON b.id = f.board_id \
             WHERE f.user_id = ? ORDER BY f.id",
            BOARD_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_board).collect())
    }

    async fn touch_last_seen(&self, board_id: Id, user_id: Id) -> DbResult<()> {
        sqlx::query(&format!(
            "INSERT INTO board_last_seen (board_id, user_id, timestamp, seq) VALUES (?, ?, ?, {}) \
             ON CONFLICT (board_id, user_id) \
             DO UPDATE SET timestamp = excluded.timestamp, seq = excluded.seq",
            NEXT_SEEN_SEQ
        ))
        .bind(board_id)
        .bind(user_id)
        .bind(current_timestamp())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn list_last_seen(&self, user_id: Id) -> DbResult<Vec<LastSeen>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, s.timestamp FROM board_last_seen s JOIN board b ON b.id = s.board_id \
             WHERE s.user_id = ? ORDER BY s.seq DESC",
            BOARD_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows
            .iter()
            .map(|row| LastSeen {
                board: row_to_board(row),
                timestamp: row.get("timestamp"),
            })
            .collect())
    }
}

fn row_to_board(row: &sqlx::sqlite::SqliteRow) -> Board {
    Board {
        id: row.get("id"),
        project_id: row.get("project_id"),
        title: row.get("title"),
        background_img: row.get("background_img"),
        is_archived: row.get("is_archived"),
        created_on: row.get("created_on"),
        last_modified: row.get("last_modified"),
    }
}

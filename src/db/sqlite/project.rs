//! SQLite ProjectRepository implementation.

use sqlx::{Row, SqlitePool};

use super::helpers::{database_error, expect_affected};
use crate::db::utils::current_timestamp;
use crate::db::{DbError, DbResult, Id, Project, ProjectRepository};

/// SQLx-backed project repository.
pub struct SqliteProjectRepository {
    pub(crate) pool: SqlitePool,
}

impl ProjectRepository for SqliteProjectRepository {
    async fn create(&self, project: &Project) -> DbResult<Project> {
        // Always generate current timestamps - never use input timestamps
        let created_at = current_timestamp();
        let updated_at = created_at.clone();

        let result = sqlx::query(
            "INSERT INTO project (owner_id, title, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project.owner_id)
        .bind(&project.title)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(Project {
            id: result.last_insert_rowid(),
            owner_id: project.owner_id,
            title: project.title.clone(),
            created_at,
            updated_at,
        })
    }

    async fn get(&self, id: Id) -> DbResult<Project> {
        let row = sqlx::query(
            "SELECT id, owner_id, title, created_at, updated_at FROM project WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        row.as_ref()
            .map(row_to_project)
            .ok_or_else(|| DbError::not_found("Project", id))
    }

    async fn list_by_owner(&self, owner_id: Id) -> DbResult<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, title, created_at, updated_at FROM project \
             WHERE owner_id = ? ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(rows.iter().map(row_to_project).collect())
    }

    async fn update(&self, project: &Project) -> DbResult<Project> {
        let updated_at = current_timestamp();

        let result = sqlx::query(
            "UPDATE project SET title = ?, owner_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&project.title)
        .bind(project.owner_id)
        .bind(&updated_at)
        .bind(project.id)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        expect_affected(result, "Project", project.id)?;

        Ok(Project {
            updated_at,
            ..project.clone()
        })
    }

    async fn delete(&self, id: Id) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM project WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        expect_affected(result, "Project", id)
    }
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> Project {
    Project {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

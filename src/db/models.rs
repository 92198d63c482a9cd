//! Domain models for the kanban database.
//!
//! These models are storage-agnostic and represent the core entities
//! used throughout the application.

use serde::{Deserialize, Serialize};

/// Integer primary key used for all entities.
pub type Id = i64;

// =============================================================================
// Accounts
// =============================================================================

/// An account that can own projects and be invited to boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub date_joined: String,
}

/// Fields required to register a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// =============================================================================
// Projects and boards
// =============================================================================

/// A project is owned by exactly one user and groups boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub owner_id: Id,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A kanban workspace inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: Id,
    pub project_id: Id,
    pub title: String,
    /// Path of the background image relative to the media root.
    pub background_img: Option<String>,
    pub is_archived: bool,
    pub created_on: String,
    pub last_modified: String,
}

/// Facts about a user's relationship to a board, loaded in one query and
/// fed to the access predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAccess {
    pub board_id: Id,
    /// Owner of the project the board belongs to.
    pub owner_id: Id,
    /// Whether the user has a `board_member` row for this board.
    pub is_member: bool,
}

/// A board the user viewed, with the time of the last view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSeen {
    pub board: Board,
    pub timestamp: String,
}

/// Board with its full nested subtree.
#[derive(Debug, Clone)]
pub struct BoardDetail {
    pub board: Board,
    pub columns: Vec<ColumnDetail>,
    pub members: Vec<User>,
}

// =============================================================================
// Columns and cards
// =============================================================================

/// An ordered grouping of cards within a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: Id,
    pub board_id: Id,
    pub title: String,
}

/// Column with its cards, each fully nested.
#[derive(Debug, Clone)]
pub struct ColumnDetail {
    pub column: Column,
    pub cards: Vec<CardDetail>,
}

/// A unit of work within a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Id,
    pub column_id: Id,
    pub title: String,
    pub description: String,
    /// RFC 3339 timestamp.
    pub deadline: String,
    /// Freeform checklist data.
    pub checklist: serde_json::Value,
}

/// Card with its marks, files and comments.
#[derive(Debug, Clone)]
pub struct CardDetail {
    pub card: Card,
    pub marks: Vec<Mark>,
    pub files: Vec<CardFile>,
    pub comments: Vec<CardComment>,
}

/// A colored label defined per board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub id: Id,
    pub board_id: Id,
    pub title: String,
    pub color: String,
}

/// An uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFile {
    pub id: Id,
    pub card_id: Id,
    /// Path relative to the media root.
    pub file: String,
    /// Original file name as uploaded.
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub created_on: String,
}

/// A comment on a card; only its author may change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardComment {
    pub id: Id,
    pub card_id: Id,
    pub user_id: Id,
    pub body: String,
    pub created_on: String,
}

//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing business logic.
//!
//! Methods return `Send` futures so handlers generic over [`Database`]
//! can be used as axum handlers.

use std::future::Future;

use crate::db::{
    DbResult,
    models::{
        Board, BoardAccess, BoardDetail, Card, CardComment, CardDetail, CardFile, Column,
        ColumnDetail, Id, LastSeen, Mark, NewUser, Project, User,
    },
};

/// Repository for User and API token operations.
pub trait UserRepository {
    /// Create a new user.
    fn create(&self, user: &NewUser) -> impl Future<Output = DbResult<User>> + Send;

    /// Get a user by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<User>> + Send;

    /// Find a user by email (case-insensitive).
    fn find_by_email(&self, email: &str) -> impl Future<Output = DbResult<Option<User>>> + Send;

    /// Issue a new API token for a user. Returns the plain key.
    fn issue_token(&self, user_id: Id) -> impl Future<Output = DbResult<String>> + Send;

    /// Resolve a plain token key to its user.
    fn find_by_token(&self, key: &str) -> impl Future<Output = DbResult<Option<User>>> + Send;
}

/// Repository for Project operations.
pub trait ProjectRepository {
    /// Create a new project.
    fn create(&self, project: &Project) -> impl Future<Output = DbResult<Project>> + Send;

    /// Get a project by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Project>> + Send;

    /// Get all projects owned by a user.
    fn list_by_owner(&self, owner_id: Id) -> impl Future<Output = DbResult<Vec<Project>>> + Send;

    /// Update an existing project.
    fn update(&self, project: &Project) -> impl Future<Output = DbResult<Project>> + Send;

    /// Delete a project (and its boards) by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Board operations, including membership, favourites
/// and last-seen bookkeeping.
pub trait BoardRepository {
    /// Create a board and make `creator_id` a member with a last-seen row,
    /// atomically.
    fn create(&self, board: &Board, creator_id: Id)
    -> impl Future<Output = DbResult<Board>> + Send;

    /// Get a board by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Board>> + Send;

    /// Get a board with columns, cards and members.
    fn get_detail(&self, id: Id) -> impl Future<Output = DbResult<BoardDetail>> + Send;

    /// Get all boards of a project.
    fn list_by_project(&self, project_id: Id) -> impl Future<Output = DbResult<Vec<Board>>> + Send;

    /// Get boards the user is a member of, optionally filtered by archive flag.
    fn list_for_member(
        &self,
        user_id: Id,
        is_archived: Option<bool>,
    ) -> impl Future<Output = DbResult<Vec<Board>>> + Send;

    /// Update an existing board.
    fn update(&self, board: &Board) -> impl Future<Output = DbResult<Board>> + Send;

    /// Delete a board by ID. Cascades to everything under it.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;

    /// Load the ownership/membership facts for a user on a board.
    fn access(&self, board_id: Id, user_id: Id)
    -> impl Future<Output = DbResult<BoardAccess>> + Send;

    /// Add a member. Fails with `AlreadyExists` if already a member.
    fn add_member(&self, board_id: Id, user_id: Id) -> impl Future<Output = DbResult<()>> + Send;

    /// Get all members of a board in join order.
    fn members(&self, board_id: Id) -> impl Future<Output = DbResult<Vec<User>>> + Send;

    /// Mark a board as favourite. Returns false if it already was.
    fn add_favourite(&self, board_id: Id, user_id: Id)
    -> impl Future<Output = DbResult<bool>> + Send;

    /// Remove a favourite marker.
    fn remove_favourite(&self, board_id: Id, user_id: Id)
    -> impl Future<Output = DbResult<()>> + Send;

    /// Get a user's favourite boards.
    fn list_favourites(&self, user_id: Id) -> impl Future<Output = DbResult<Vec<Board>>> + Send;

    /// Get-or-create the last-seen row and refresh its timestamp.
    fn touch_last_seen(&self, board_id: Id, user_id: Id)
    -> impl Future<Output = DbResult<()>> + Send;

    /// Get a user's last-seen boards, most recent first.
    fn list_last_seen(&self, user_id: Id) -> impl Future<Output = DbResult<Vec<LastSeen>>> + Send;
}

/// Repository for Column operations.
pub trait ColumnRepository {
    /// Create a new column.
    fn create(&self, column: &Column) -> impl Future<Output = DbResult<Column>> + Send;

    /// Get a column by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Column>> + Send;

    /// Get a column with its nested cards.
    fn get_detail(&self, id: Id) -> impl Future<Output = DbResult<ColumnDetail>> + Send;

    /// Get all columns of a board with their nested cards.
    fn list_by_board(&self, board_id: Id)
    -> impl Future<Output = DbResult<Vec<ColumnDetail>>> + Send;

    /// Update an existing column.
    fn update(&self, column: &Column) -> impl Future<Output = DbResult<Column>> + Send;

    /// Delete a column (and its cards) by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Card operations, including mark attachment.
pub trait CardRepository {
    /// Create a new card.
    fn create(&self, card: &Card) -> impl Future<Output = DbResult<Card>> + Send;

    /// Get a card by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Card>> + Send;

    /// Get a card with marks, files and comments.
    fn get_detail(&self, id: Id) -> impl Future<Output = DbResult<CardDetail>> + Send;

    /// Get all cards of a column, fully nested.
    fn list_by_column(&self, column_id: Id)
    -> impl Future<Output = DbResult<Vec<CardDetail>>> + Send;

    /// Update an existing card (including moving it to another column).
    fn update(&self, card: &Card) -> impl Future<Output = DbResult<Card>> + Send;

    /// Delete a card by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;

    /// Resolve the board a card lives on.
    fn board_id(&self, id: Id) -> impl Future<Output = DbResult<Id>> + Send;

    /// Attach a mark to a card. Attaching twice is a no-op.
    fn attach_mark(&self, card_id: Id, mark_id: Id) -> impl Future<Output = DbResult<()>> + Send;

    /// Detach a mark from a card.
    fn detach_mark(&self, card_id: Id, mark_id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for Mark operations.
pub trait MarkRepository {
    /// Create a new mark.
    fn create(&self, mark: &Mark) -> impl Future<Output = DbResult<Mark>> + Send;

    /// Get a mark by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<Mark>> + Send;

    /// Get all marks of a board.
    fn list_by_board(&self, board_id: Id) -> impl Future<Output = DbResult<Vec<Mark>>> + Send;

    /// Update an existing mark.
    fn update(&self, mark: &Mark) -> impl Future<Output = DbResult<Mark>> + Send;

    /// Delete a mark by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for CardFile operations.
pub trait CardFileRepository {
    /// Record an uploaded file.
    fn create(&self, file: &CardFile) -> impl Future<Output = DbResult<CardFile>> + Send;

    /// Get a file record by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<CardFile>> + Send;

    /// Get all files of a card.
    fn list_by_card(&self, card_id: Id) -> impl Future<Output = DbResult<Vec<CardFile>>> + Send;

    /// Get all files attached to cards of a column.
    fn list_by_column(&self, column_id: Id)
    -> impl Future<Output = DbResult<Vec<CardFile>>> + Send;

    /// Get all files attached to cards of a board.
    fn list_by_board(&self, board_id: Id) -> impl Future<Output = DbResult<Vec<CardFile>>> + Send;

    /// Get all files attached to cards of any board in a project.
    fn list_by_project(&self, project_id: Id)
    -> impl Future<Output = DbResult<Vec<CardFile>>> + Send;

    /// Delete a file record by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Repository for CardComment operations.
pub trait CommentRepository {
    /// Create a new comment.
    fn create(&self, comment: &CardComment)
    -> impl Future<Output = DbResult<CardComment>> + Send;

    /// Get a comment by ID.
    fn get(&self, id: Id) -> impl Future<Output = DbResult<CardComment>> + Send;

    /// Get all comments of a card.
    fn list_by_card(&self, card_id: Id)
    -> impl Future<Output = DbResult<Vec<CardComment>>> + Send;

    /// Update a comment body.
    fn update(&self, comment: &CardComment)
    -> impl Future<Output = DbResult<CardComment>> + Send;

    /// Delete a comment by ID.
    fn delete(&self, id: Id) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
///
/// Repositories are cheap handles onto the same store, created per call.
pub trait Database: Send + Sync {
    type Users: UserRepository + Send + Sync;
    type Projects: ProjectRepository + Send + Sync;
    type Boards: BoardRepository + Send + Sync;
    type Columns: ColumnRepository + Send + Sync;
    type Cards: CardRepository + Send + Sync;
    type Marks: MarkRepository + Send + Sync;
    type Files: CardFileRepository + Send + Sync;
    type Comments: CommentRepository + Send + Sync;

    /// Run pending migrations.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the user repository.
    fn users(&self) -> Self::Users;

    /// Get the project repository.
    fn projects(&self) -> Self::Projects;

    /// Get the board repository.
    fn boards(&self) -> Self::Boards;

    /// Get the column repository.
    fn columns(&self) -> Self::Columns;

    /// Get the card repository.
    fn cards(&self) -> Self::Cards;

    /// Get the mark repository.
    fn marks(&self) -> Self::Marks;

    /// Get the card file repository.
    fn files(&self) -> Self::Files;

    /// Get the comment repository.
    fn comments(&self) -> Self::Comments;
}

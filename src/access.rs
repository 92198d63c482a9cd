//! Access-control predicates.
//!
//! Every check is a pure function over the acting user's id and facts
//! loaded from the store. Handlers load the facts, call a predicate and map
//! a `false` to 403.

use axum::http::Method;

use crate::db::{BoardAccess, CardComment, Id, Project};

/// What a request intends to do with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl From<&Method> for Action {
    fn from(method: &Method) -> Self {
        if method == Method::GET {
            Action::Read
        } else {
            Action::Write
        }
    }
}

/// Only the owner may read, change or delete a project and its board list.
pub fn can_access_project(user_id: Id, project: &Project) -> bool {
    project.owner_id == user_id
}

/// The project owner may do anything with a board; members may only read it.
pub fn can_access_board(user_id: Id, access: &BoardAccess, action: Action) -> bool {
    access.owner_id == user_id || (access.is_member && action == Action::Read)
}

/// Columns, cards, marks, files and comments are open to board members.
pub fn is_board_member(access: &BoardAccess) -> bool {
    access.is_member
}

/// A comment may be changed only by its author, and only while they remain
/// a member of the board.
pub fn can_edit_comment(user_id: Id, comment: &CardComment, access: &BoardAccess) -> bool {
    comment.user_id == user_id && access.is_member
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Id = 1;
    const MEMBER: Id = 2;
    const STRANGER: Id = 3;

    fn access(is_member: bool) -> BoardAccess {
        BoardAccess {
            board_id: 10,
            owner_id: OWNER,
            is_member,
        }
    }

    fn comment(author: Id) -> CardComment {
        CardComment {
            id: 1,
            card_id: 1,
            user_id: author,
            body: "hi".to_string(),
            created_on: String::new(),
        }
    }

    #[test]
    fn only_get_is_a_read() {
        assert_eq!(Action::from(&Method::GET), Action::Read);
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert_eq!(Action::from(&method), Action::Write);
        }
    }

    #[test]
    fn project_requires_owner() {
        let project = Project {
            id: 1,
            owner_id: OWNER,
            title: "p".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(can_access_project(OWNER, &project));
        assert!(!can_access_project(STRANGER, &project));
    }

    #[test]
    fn owner_may_write_board_without_membership() {
        assert!(can_access_board(OWNER, &access(false), Action::Write));
        assert!(can_access_board(OWNER, &access(true), Action::Read));
    }

    #[test]
    fn member_may_only_read_board() {
        assert!(can_access_board(MEMBER, &access(true), Action::Read));
        assert!(!can_access_board(MEMBER, &access(true), Action::Write));
    }

    #[test]
    fn stranger_may_not_touch_board() {
        assert!(!can_access_board(STRANGER, &access(false), Action::Read));
        assert!(!can_access_board(STRANGER, &access(false), Action::Write));
    }

    #[test]
    fn comment_needs_author_and_membership() {
        assert!(can_edit_comment(MEMBER, &comment(MEMBER), &access(true)));
        assert!(!can_edit_comment(MEMBER, &comment(OWNER), &access(true)));
        assert!(!can_edit_comment(MEMBER, &comment(MEMBER), &access(false)));
    }

    #[test]
    fn membership_is_the_flag() {
        assert!(is_board_member(&access(true)));
        assert!(!is_board_member(&access(false)));
    }
}

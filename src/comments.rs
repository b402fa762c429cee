//! Comments
//!
//! Threads on a note, optionally anchored to one of its blocks. A comment can be resolved and
//! reopened by anyone in the workspace, only its author can delete it.

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// A comment on a note
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Comment ID
    pub id: Uuid,

    /// The note commented on
    pub note_id: Uuid,

    /// Workspace of the note
    pub workspace_id: Uuid,

    /// The block commented on, the whole note when missing
    pub block_id: Option<Uuid>,

    /// Who wrote it
    pub author_id: Uuid,

    /// The comment itself
    pub content: String,

    /// Resolution, when resolved
    pub resolution: Option<Resolution>,

    /// Creation date
    pub created_at: NaiveDateTime,
}

impl Comment {
    /// Is the comment resolved?
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// Who resolved a comment and when
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved by
    pub resolved_by: Uuid,

    /// Resolved at
    pub resolved_at: NaiveDateTime,
}

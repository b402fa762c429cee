//! Activity log
//!
//! Who did what to which note, registered after the fact

use std::net::IpAddr;

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use uuid::Uuid;

use crate::comments::Comment;
use crate::notes::Note;

/// Possible activity entry types
pub enum ActivityEntry<'a> {
    /// Note is created
    CreateNote(&'a Note),

    /// Blocks of a note are replaced
    EditNote(&'a Note),

    /// Note got a new title
    RenameNote(&'a Note),

    /// Note is deleted
    DeleteNote(&'a Note),

    /// Note is restored to a revision, with the version that revision recorded
    RestoreVersion(&'a Note, i64),

    /// Comment is placed on a note
    CreateComment(&'a Comment),

    /// Comment on a note is resolved
    ResolveComment(&'a Comment),
}

impl ActivityEntry<'_> {
    /// The workspace the entry belongs to
    pub fn workspace_id(&self) -> Uuid {
        match self {
            Self::CreateNote(note)
            | Self::EditNote(note)
            | Self::RenameNote(note)
            | Self::DeleteNote(note)
            | Self::RestoreVersion(note, _) => note.workspace_id,
            Self::CreateComment(comment) | Self::ResolveComment(comment) => comment.workspace_id,
        }
    }

    /// The note the entry is about
    pub fn note_id(&self) -> Uuid {
        match self {
            Self::CreateNote(note)
            | Self::EditNote(note)
            | Self::RenameNote(note)
            | Self::DeleteNote(note)
            | Self::RestoreVersion(note, _) => note.id,
            Self::CreateComment(comment) | Self::ResolveComment(comment) => comment.note_id,
        }
    }

    /// The kind of entry
    pub fn action(&self) -> ActivityAction {
        match self {
            Self::CreateNote(_) => ActivityAction::CreateNote,
            Self::EditNote(_) => ActivityAction::EditNote,
            Self::RenameNote(_) => ActivityAction::RenameNote,
            Self::DeleteNote(_) => ActivityAction::DeleteNote,
            Self::RestoreVersion(..) => ActivityAction::RestoreVersion,
            Self::CreateComment(..) => ActivityAction::CreateComment,
            Self::ResolveComment(..) => ActivityAction::ResolveComment,
        }
    }

    /// Extra information stored with the entry
    pub fn metadata(&self) -> Value {
        match self {
            Self::RenameNote(note) => json!({ "newTitle": note.title }),
            Self::DeleteNote(note) => json!({ "title": note.title }),
            Self::RestoreVersion(_, restored_from) => json!({ "restoredFrom": restored_from }),
            Self::CreateComment(comment) => {
                json!({ "commentId": comment.id, "blockId": comment.block_id })
            }
            Self::ResolveComment(comment) => json!({ "commentId": comment.id }),
            Self::CreateNote(_) | Self::EditNote(_) => json!({}),
        }
    }
}

/// Kind of activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityAction {
    /// Note is created
    CreateNote,

    /// Blocks of a note are replaced
    EditNote,

    /// Note got a new title
    RenameNote,

    /// Note is deleted
    DeleteNote,

    /// Note is restored to a revision
    RestoreVersion,

    /// Comment is placed on a note
    CreateComment,

    /// Comment on a note is resolved
    ResolveComment,
}

/// A registered activity
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity ID
    pub id: Uuid,

    /// Kind of activity
    pub action: ActivityAction,

    /// The workspace it happened in
    pub workspace_id: Uuid,

    /// The note it happened to
    pub note_id: Uuid,

    /// Who did it
    pub actor_id: Uuid,

    /// Extra information
    pub metadata: Value,

    /// Where the request came from, when known
    #[serde(skip)]
    pub ip_address: Option<IpAddr>,

    /// When it happened
    pub created_at: NaiveDateTime,
}

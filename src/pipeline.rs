//! Note update pipeline
//!
//! Plans a single atomic change of a note: version check, block replacement, title change,
//! version bump and the revision to record. Planning is pure, storage backends apply the plan
//! inside the same transaction (or lock) in which they read the current note.

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

use crate::blocks::BlockDraft;
use crate::blocks::BlockError;
use crate::blocks::materialize;
use crate::blocks::same_content;
use crate::guard;
use crate::guard::Conflict;
use crate::notes::Note;
use crate::realtime::NoteEvent;
use crate::realtime::diff_blocks;
use crate::revisions::NewRevision;

/// What kind of change is being made
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    /// A regular edit by a client
    Edit,

    /// Reverting to a revision
    Restore {
        /// The revision being restored
        revision_id: Uuid,

        /// The version that revision recorded
        restored_from: i64,
    },
}

/// A requested change of a note
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteChange {
    /// The actor making the change
    pub editor: Uuid,

    /// The version the change is based on
    pub expected_version: i64,

    /// New title, if any
    pub title: Option<String>,

    /// New block list, if any
    ///
    /// An empty list leaves the blocks of an edit untouched
    pub blocks: Option<Vec<BlockDraft>>,

    /// Edit or restore
    pub kind: ChangeKind,
}

impl NoteChange {
    /// A regular edit
    pub fn edit(
        editor: Uuid,
        expected_version: i64,
        title: Option<String>,
        blocks: Option<Vec<BlockDraft>>,
    ) -> Self {
        Self {
            editor,
            expected_version,
            title,
            blocks,
            kind: ChangeKind::Edit,
        }
    }
}

/// Everything a storage backend has to persist for a change
#[derive(Clone, Debug)]
pub struct UpdatePlan {
    /// The note as it will be after the change
    pub note: Note,

    /// The block list is replaced wholesale
    pub blocks_replaced: bool,

    /// The title changed
    pub title_changed: bool,

    /// Revision to append, if any
    pub revision: Option<NewRevision>,

    /// Notifications to publish once committed
    pub events: Vec<NoteEvent>,
}

/// Why a change can not be planned
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The version guard did not pass
    #[error("Note has been modified by another user")]
    Conflict(Box<Conflict>),

    /// The new block list is invalid
    #[error(transparent)]
    Invalid(#[from] BlockError),
}

/// Plan a change against the current stored note
pub fn plan(current: &Note, change: &NoteChange, now: NaiveDateTime) -> Result<UpdatePlan, PlanError> {
    guard::check(change.expected_version, current).map_err(PlanError::Conflict)?;

    let new_blocks = match (&change.blocks, change.kind) {
        (Some(drafts), ChangeKind::Restore { .. }) => Some(materialize(drafts)?),
        (Some(drafts), ChangeKind::Edit) if !drafts.is_empty() => {
            let blocks = materialize(drafts)?;

            if same_content(&current.blocks, &blocks) {
                None
            } else {
                Some(blocks)
            }
        }
        _ => None,
    };

    let new_title = change
        .title
        .as_ref()
        .filter(|title| **title != current.title);

    let mut note = current.clone();
    note.version = current.version + 1;
    note.last_edited_by = change.editor;
    note.last_edited_at = now;

    if let Some(title) = new_title {
        note.title.clone_from(title);
    }

    let blocks_replaced = new_blocks.is_some();
    let title_changed = new_title.is_some();

    let events = if let Some(blocks) = new_blocks {
        let events = diff_blocks(current, &blocks, note.version, change.editor);
        note.blocks = blocks;
        events
    } else {
        Vec::new()
    };

    let revision = match change.kind {
        ChangeKind::Edit if blocks_replaced || title_changed => Some(NewRevision {
            blocks: note.blocks.clone(),
            version: note.version,
            created_by: change.editor,
        }),
        ChangeKind::Edit => None,
        ChangeKind::Restore { .. } => Some(NewRevision {
            blocks: current.blocks.clone(),
            version: current.version,
            created_by: change.editor,
        }),
    };

    Ok(UpdatePlan {
        note,
        blocks_replaced,
        title_changed,
        revision,
        events,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::blocks::BlockType;

    fn stored_note(version: i64, contents: &[&str]) -> Note {
        let drafts = contents
            .iter()
            .map(|content| BlockDraft::paragraph(*content))
            .collect::<Vec<_>>();

        Note {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            title: "Plan".to_string(),
            blocks: materialize(&drafts).unwrap(),
            version,
            created_by: Uuid::new_v4(),
            last_edited_by: Uuid::new_v4(),
            created_at: Utc::now().naive_utc(),
            last_edited_at: Utc::now().naive_utc(),
        }
    }

    fn contents(note: &Note) -> Vec<&str> {
        note.blocks.iter().map(|block| block.content.as_str()).collect()
    }

    #[test]
    fn test_edit_replaces_blocks_and_records_new_version() {
        let current = stored_note(3, &["A"]);
        let editor = Uuid::new_v4();
        let change = NoteChange::edit(editor, 3, None, Some(vec![BlockDraft::paragraph("A2")]));

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!(4, plan.note.version);
        assert_eq!(vec!["A2"], contents(&plan.note));
        assert_eq!(editor, plan.note.last_edited_by);
        assert!(plan.blocks_replaced);

        let revision = plan.revision.unwrap();
        assert_eq!(4, revision.version);
        assert_eq!(plan.note.blocks, revision.blocks);
        assert_eq!(editor, revision.created_by);
    }

    #[test]
    fn test_stale_version_is_a_conflict() {
        let current = stored_note(4, &["A2"]);
        let change = NoteChange::edit(
            Uuid::new_v4(),
            3,
            None,
            Some(vec![BlockDraft::paragraph("B2")]),
        );

        let Err(PlanError::Conflict(conflict)) = plan(&current, &change, Utc::now().naive_utc())
        else {
            panic!("expected a conflict");
        };

        assert_eq!(4, conflict.current_version);
        assert_eq!(3, conflict.client_version);
        assert_eq!(current.blocks, conflict.current_blocks);
    }

    #[test]
    fn test_no_op_bumps_version_without_revision() {
        let current = stored_note(2, &["A"]);
        let change = NoteChange::edit(
            Uuid::new_v4(),
            2,
            Some("Plan".to_string()),
            Some(vec![BlockDraft::paragraph("A")]),
        );

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!(3, plan.note.version);
        assert!(!plan.blocks_replaced);
        assert!(!plan.title_changed);
        assert_eq!(None, plan.revision);
        assert!(plan.events.is_empty());
        assert_eq!(current.blocks, plan.note.blocks);
    }

    #[test]
    fn test_empty_block_list_keeps_blocks() {
        let current = stored_note(1, &["A"]);
        let change = NoteChange::edit(Uuid::new_v4(), 1, None, Some(Vec::new()));

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!(current.blocks, plan.note.blocks);
        assert_eq!(None, plan.revision);
    }

    #[test]
    fn test_title_change_records_revision() {
        let current = stored_note(1, &["A"]);
        let change = NoteChange::edit(Uuid::new_v4(), 1, Some("Renamed".to_string()), None);

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!("Renamed", plan.note.title);
        assert!(plan.title_changed);
        assert_eq!(Some(2), plan.revision.map(|revision| revision.version));
    }

    #[test]
    fn test_type_change_counts_as_change() {
        let current = stored_note(1, &["A"]);
        let change = NoteChange::edit(
            Uuid::new_v4(),
            1,
            None,
            Some(vec![BlockDraft {
                block_type: Some(BlockType::Code),
                content: Some("A".to_string()),
                ..BlockDraft::default()
            }]),
        );

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert!(plan.blocks_replaced);
        assert_eq!(BlockType::Code, plan.note.blocks[0].block_type);
    }

    #[test]
    fn test_restore_snapshots_pre_restore_state() {
        let current = stored_note(5, &["current"]);
        let editor = Uuid::new_v4();
        let change = NoteChange {
            editor,
            expected_version: 5,
            title: None,
            blocks: Some(vec![BlockDraft::paragraph("old")]),
            kind: ChangeKind::Restore {
                revision_id: Uuid::new_v4(),
                restored_from: 2,
            },
        };

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!(6, plan.note.version);
        assert_eq!(vec!["old"], contents(&plan.note));

        let revision = plan.revision.unwrap();
        assert_eq!(5, revision.version);
        assert_eq!(current.blocks, revision.blocks);
        assert_eq!(editor, revision.created_by);
    }

    #[test]
    fn test_restore_of_identical_blocks_still_bumps() {
        let current = stored_note(5, &["same"]);
        let change = NoteChange {
            editor: Uuid::new_v4(),
            expected_version: 5,
            title: None,
            blocks: Some(current.blocks.iter().map(BlockDraft::from).collect()),
            kind: ChangeKind::Restore {
                revision_id: Uuid::new_v4(),
                restored_from: 5,
            },
        };

        let plan = plan(&current, &change, Utc::now().naive_utc()).unwrap();

        assert_eq!(6, plan.note.version);
        assert!(plan.revision.is_some());
        assert!(plan.events.is_empty());
    }
}

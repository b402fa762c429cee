//! Restore a note to a revision
//!
//! A restore is an update through the regular pipeline: it is guarded by the version the note
//! has right now, and the blocks it overwrites are kept as a revision so the restore itself
//! can be undone.

use uuid::Uuid;

use crate::blocks::BlockDraft;
use crate::notes::Note;
use crate::pipeline::ChangeKind;
use crate::pipeline::NoteChange;
use crate::revisions::Revision;

/// The change that brings `note` back to the blocks of `revision`
///
/// Restoring the revision the note already matches is not short-circuited, the version still
/// moves on.
pub fn restore_change(note: &Note, revision: &Revision, editor: Uuid) -> NoteChange {
    NoteChange {
        editor,
        expected_version: note.version,
        title: None,
        blocks: Some(revision.blocks.iter().map(BlockDraft::from).collect()),
        kind: ChangeKind::Restore {
            revision_id: revision.id,
            restored_from: revision.version,
        },
    }
}

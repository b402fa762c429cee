//! Client save controller
//!
//! Owns the local copy of the open note and decides what a save looks like and what its
//! response means. Pure state, timers and network live in [`autosave`](super::autosave).
//!
//! Local edits are never dropped: not while a save is in flight, not on an error and not on a
//! conflict. A conflict blocks saving until the user picks a side.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::blocks::BlockDraft;
use crate::blocks::BlockType;
use crate::notes::Note;

use super::RemoteSnapshot;
use super::RequestSequencer;
use super::TransportError;

/// Where the open note stands with the server
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing changed since opening
    #[default]
    Idle,

    /// Local edits waiting for a save
    Unsaved,

    /// A save is in flight
    Saving,

    /// The server has everything
    Saved,

    /// The last save failed, edits are kept
    Error,

    /// The server moved on, the user has to pick local or remote
    Conflict,
}

/// A local edit of the open note
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit {
    /// Replace the text of a block
    UpdateContent { block_id: Uuid, content: String },

    /// Insert a block at a position
    InsertBlock { index: usize, block: BlockDraft },

    /// Remove a block
    DeleteBlock { block_id: Uuid },

    /// Change the type of a block
    ChangeType {
        block_id: Uuid,
        block_type: BlockType,
    },

    /// Flip a checkbox
    ToggleCheckbox { block_id: Uuid },

    /// Give the note a new title
    Rename { title: String },
}

/// Everything a save sends to the server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveRequest {
    /// Sequence number of the save
    pub seq: u64,

    /// The note being saved
    pub note_id: Uuid,

    /// Full local title
    pub title: String,

    /// Full local block list
    pub blocks: Vec<BlockDraft>,

    /// The version the client believes is current
    pub version: i64,
}

/// Both sides of a conflict
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictState {
    /// Local title when the conflict came in
    pub local_title: String,

    /// Local blocks when the conflict came in
    pub local_blocks: Vec<BlockDraft>,

    /// What the server has
    pub remote: RemoteSnapshot,
}

/// The open note
#[derive(Clone, Debug)]
struct Session {
    /// The note being edited
    note_id: Uuid,

    /// Local title, edits included
    title: String,

    /// Local blocks, edits included
    blocks: Vec<BlockDraft>,

    /// The version saves are based on
    version: i64,

    /// Title the server acknowledged last
    synced_title: String,

    /// Blocks the server acknowledged last
    synced_blocks: Vec<BlockDraft>,

    /// Counts local edits, to tell whether a save covered all of them
    edits: u64,

    /// Unresolved conflict, saving waits for the user
    conflict: Option<ConflictState>,

    /// Someone else changed the note since it was opened
    remote_changed: bool,
}

/// A save waiting for its response
#[derive(Clone, Debug)]
struct InFlight {
    /// The request as it was sent
    request: SaveRequest,

    /// Local edits covered by the request
    edits: u64,
}

/// The save state machine of a single editing session
#[derive(Clone, Debug, Default)]
pub struct SaveController {
    /// The open note, if any
    session: Option<Session>,

    /// Saves waiting for a response, by sequence number
    in_flight: BTreeMap<u64, InFlight>,

    /// Hands out sequence numbers and tells stale responses apart
    sequencer: RequestSequencer,

    /// What the user sees
    status: SaveStatus,

    /// Message of the last failed save
    error: Option<String>,
}

impl SaveController {
    /// Create a controller without an open note
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a note, dropping whatever was open before
    ///
    /// Responses to saves of the previous note are ignored from now on
    pub fn open(&mut self, note: &Note) {
        let blocks = note.blocks.iter().map(BlockDraft::from).collect::<Vec<_>>();

        self.session = Some(Session {
            note_id: note.id,
            title: note.title.clone(),
            blocks: blocks.clone(),
            version: note.version,
            synced_title: note.title.clone(),
            synced_blocks: blocks,
            edits: 0,
            conflict: None,
            remote_changed: false,
        });
        self.in_flight.clear();
        self.status = SaveStatus::Idle;
        self.error = None;
    }

    /// Close the open note
    pub fn close(&mut self) {
        self.session = None;
        self.in_flight.clear();
        self.status = SaveStatus::Idle;
        self.error = None;
    }

    /// Apply a local edit, `false` when it changed nothing
    pub fn apply(&mut self, edit: Edit) -> bool {
        match edit {
            Edit::UpdateContent { block_id, content } => self.update_content(&block_id, content),
            Edit::InsertBlock { index, block } => self.insert_block(index, block).is_some(),
            Edit::DeleteBlock { block_id } => self.delete_block(&block_id),
            Edit::ChangeType {
                block_id,
                block_type,
            } => self.change_type(&block_id, block_type),
            Edit::ToggleCheckbox { block_id } => self.toggle_checkbox(&block_id),
            Edit::Rename { title } => self.rename(title),
        }
    }

    /// Replace the text of a block
    pub fn update_content<C: Into<String>>(&mut self, block_id: &Uuid, content: C) -> bool {
        let content = content.into();

        self.edit_block(block_id, |block| {
            if block.content.as_deref().unwrap_or_default() == content {
                return false;
            }

            block.content = Some(content);

            true
        })
    }

    /// Insert a block, returns its ID
    ///
    /// Blocks without an ID get one, an index past the end appends
    pub fn insert_block(&mut self, index: usize, mut block: BlockDraft) -> Option<Uuid> {
        let session = self.session.as_mut()?;

        let block_id = *block.id.get_or_insert_with(Uuid::new_v4);
        let index = index.min(session.blocks.len());

        session.blocks.insert(index, block);
        self.touch();

        Some(block_id)
    }

    /// Remove a block
    ///
    /// The last block stays, a note always has at least one
    pub fn delete_block(&mut self, block_id: &Uuid) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.blocks.len() <= 1 {
            return false;
        }

        let before = session.blocks.len();
        session
            .blocks
            .retain(|block| block.id.as_ref() != Some(block_id));

        if session.blocks.len() == before {
            return false;
        }

        self.touch();

        true
    }

    /// Change the type of a block
    pub fn change_type(&mut self, block_id: &Uuid, block_type: BlockType) -> bool {
        self.edit_block(block_id, |block| {
            if block.block_type.unwrap_or_default() == block_type {
                return false;
            }

            block.block_type = Some(block_type);

            true
        })
    }

    /// Flip a checkbox, other block types are left alone
    pub fn toggle_checkbox(&mut self, block_id: &Uuid) -> bool {
        self.edit_block(block_id, |block| {
            if block.block_type != Some(BlockType::Checkbox) {
                return false;
            }

            block.checked = Some(!block.checked.unwrap_or(false));

            true
        })
    }

    /// Give the note a new title
    pub fn rename<T: Into<String>>(&mut self, title: T) -> bool {
        let title = title.into();

        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.title == title {
            return false;
        }

        session.title = title;
        self.touch();

        true
    }

    /// Start a save of everything local
    ///
    /// Only with unsaved edits or after a failed save, never during a conflict
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        if !matches!(self.status, SaveStatus::Unsaved | SaveStatus::Error) {
            return None;
        }

        let session = self.session.as_ref()?;

        let request = SaveRequest {
            seq: self.sequencer.next_seq(),
            note_id: session.note_id,
            title: session.title.clone(),
            blocks: session.blocks.clone(),
            version: session.version,
        };

        self.in_flight.insert(
            request.seq,
            InFlight {
                request: request.clone(),
                edits: session.edits,
            },
        );
        self.status = SaveStatus::Saving;

        Some(request)
    }

    /// Handle the response of a save, with the new version on success
    ///
    /// Returns `false` when the response is ignored: it belongs to another note or an earlier
    /// save was already overtaken by a later one.
    pub fn complete(&mut self, seq: u64, result: Result<i64, TransportError>) -> bool {
        let Some(in_flight) = self.in_flight.remove(&seq) else {
            tracing::debug!("Ignoring response of save {seq}, the note is no longer open");
            return false;
        };

        if self.sequencer.is_stale(seq) {
            tracing::debug!(
                "Discarding stale response of save {seq}, save {} is already applied",
                self.sequencer.committed()
            );
            return false;
        }

        let newer_in_flight = self.in_flight.keys().any(|pending| *pending > seq);

        let Some(session) = self.session.as_mut() else {
            return false;
        };

        match result {
            Ok(version) => {
                self.sequencer.commit(seq);

                session.version = version;
                session.synced_title = in_flight.request.title;
                session.synced_blocks = in_flight.request.blocks;
                session.conflict = None;

                self.error = None;
                self.status = if newer_in_flight {
                    SaveStatus::Saving
                } else if session.edits > in_flight.edits {
                    SaveStatus::Unsaved
                } else {
                    SaveStatus::Saved
                };
            }
            Err(TransportError::Conflict(remote)) => {
                self.sequencer.commit(seq);

                tracing::debug!(
                    "Save {seq} of note {} conflicts with version {}",
                    session.note_id,
                    remote.version
                );

                session.conflict = Some(ConflictState {
                    local_title: session.title.clone(),
                    local_blocks: session.blocks.clone(),
                    remote: *remote,
                });

                self.status = SaveStatus::Conflict;
            }
            Err(TransportError::Rejected(message) | TransportError::Transient(message)) => {
                tracing::warn!("Save {seq} of note {} failed: {message}", session.note_id);

                self.error = Some(message);

                if self.status != SaveStatus::Conflict {
                    self.status = if newer_in_flight {
                        SaveStatus::Saving
                    } else {
                        SaveStatus::Error
                    };
                }
            }
        }

        true
    }

    /// Keep the local side of a conflict
    ///
    /// The local edits become pending again, the next save is based on the version the server
    /// reported with the conflict
    pub fn resolve_with_local(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let Some(conflict) = session.conflict.take() else {
            return false;
        };

        session.version = conflict.remote.version;
        session.edits += 1;

        self.status = SaveStatus::Unsaved;
        self.error = None;

        true
    }

    /// Take the remote side of a conflict, nothing left to save
    pub fn resolve_with_remote(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let Some(conflict) = session.conflict.take() else {
            return false;
        };

        let remote = conflict.remote;
        let blocks = remote.blocks.iter().map(BlockDraft::from).collect::<Vec<_>>();

        session.title.clone_from(&remote.title);
        session.blocks.clone_from(&blocks);
        session.synced_title = remote.title;
        session.synced_blocks = blocks;
        session.version = remote.version;

        self.in_flight.clear();
        self.status = SaveStatus::Saved;
        self.error = None;

        true
    }

    /// Someone else changed the open note
    pub fn mark_remote_changed(&mut self, note_id: &Uuid) -> bool {
        match self.session.as_mut() {
            Some(session) if &session.note_id == note_id => {
                session.remote_changed = true;

                true
            }
            _ => false,
        }
    }

    /// Where the note stands
    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// Message of the last failed save
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Both sides of the current conflict
    pub fn conflict(&self) -> Option<&ConflictState> {
        self.session
            .as_ref()
            .and_then(|session| session.conflict.as_ref())
    }

    /// The open note
    pub fn note_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|session| session.note_id)
    }

    /// Local title
    pub fn title(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.title.as_str())
    }

    /// Local blocks
    pub fn blocks(&self) -> &[BlockDraft] {
        self.session
            .as_ref()
            .map_or(&[], |session| session.blocks.as_slice())
    }

    /// The version saves are based on
    pub fn version(&self) -> Option<i64> {
        self.session.as_ref().map(|session| session.version)
    }

    /// Does the server have something else than the local copy?
    pub fn has_unsaved_changes(&self) -> bool {
        self.session.as_ref().is_some_and(|session| {
            session.title != session.synced_title || session.blocks != session.synced_blocks
        })
    }

    /// Is any save waiting for its response?
    pub fn is_saving(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Did someone else change the note since it was opened?
    pub fn remote_changed(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.remote_changed)
    }

    /// Apply a change to a single block
    fn edit_block<F>(&mut self, block_id: &Uuid, change: F) -> bool
    where
        F: FnOnce(&mut BlockDraft) -> bool,
    {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let Some(block) = session
            .blocks
            .iter_mut()
            .find(|block| block.id.as_ref() == Some(block_id))
        else {
            return false;
        };

        if !change(block) {
            return false;
        }

        self.touch();

        true
    }

    /// Register a local edit
    fn touch(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.edits += 1;
        }

        if self.status != SaveStatus::Conflict {
            self.status = SaveStatus::Unsaved;
        }
    }
}

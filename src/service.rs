//! Note service
//!
//! Everything a caller can do with notes, on behalf of an actor. Access checks happen here,
//! atomic changes are delegated to the storage and notifications go out once a change is
//! committed.

use chrono::Utc;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::activity::Activity;
use crate::actors::Actor;
use crate::blocks::BlockDraft;
use crate::blocks::default_blocks;
use crate::blocks::materialize;
use crate::comments::Comment;
use crate::guard::Conflict;
use crate::notes::DEFAULT_TITLE;
use crate::notes::Note;
use crate::pipeline::NoteChange;
use crate::pipeline::PlanError;
use crate::pipeline::UpdatePlan;
use crate::realtime::ConnectionId;
use crate::realtime::EventHub;
use crate::realtime::NoteSubscription;
use crate::realtime::Participant;
use crate::realtime::SessionRegistry;
use crate::restore::restore_change;
use crate::revisions::Revision;
use crate::shares::ShareLink;
use crate::shares::generate_token;
use crate::storage;
use crate::storage::Commit;
use crate::storage::CreateCommentValues;
use crate::storage::CreateNoteValues;
use crate::storage::ShareLinkValues;
use crate::storage::Storage;

/// Default amount of activity entries in a single page
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Note or revision does not exist
    #[error("{0}")]
    NotFound(&'static str),

    /// The actor may not touch this
    #[error("{0}")]
    Forbidden(&'static str),

    /// The note moved on since the version the change is based on
    #[error("Note has been modified by another user")]
    Conflict(Box<Conflict>),

    /// The blocks of the request are invalid
    #[error("{0}")]
    Invalid(String),

    /// A value in the request is not accepted
    #[error("{0}")]
    InvalidValue(&'static str),

    /// The storage failed
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

impl From<PlanError> for Error {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Conflict(conflict) => Self::Conflict(conflict),
            PlanError::Invalid(err) => Self::Invalid(err.to_string()),
        }
    }
}

/// Result type of the service
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a note with
#[derive(Debug, Default)]
pub struct CreateNote {
    /// Title, "Untitled Note" when missing or blank
    pub title: Option<String>,

    /// Blocks, a single empty paragraph when missing or empty
    pub blocks: Option<Vec<BlockDraft>>,
}

/// Values to update a note with
#[derive(Debug)]
pub struct UpdateNote {
    /// New title
    pub title: Option<String>,

    /// New blocks, replacing all current ones when not empty
    pub blocks: Option<Vec<BlockDraft>>,

    /// The version the update is based on
    pub version: i64,
}

/// Values to create a comment with
#[derive(Debug)]
pub struct CreateComment {
    /// The comment itself, not blank
    pub content: String,

    /// Block of the note to anchor the comment to
    pub block_id: Option<Uuid>,
}

/// A note that was restored to a revision
#[derive(Debug)]
pub struct Restored {
    /// The note after the restore
    pub note: Note,

    /// The version the restored revision recorded
    pub restored_from: i64,
}

/// Note service
#[derive(Clone, Debug)]
pub struct NoteService<S: Storage> {
    /// Where everything is kept
    storage: S,

    /// Where notifications go
    events: EventHub,

    /// Who has which note open
    sessions: SessionRegistry,
}

impl<S: Storage> NoteService<S> {
    /// Create a note service
    pub fn new(storage: S, events: EventHub, sessions: SessionRegistry) -> Self {
        Self {
            storage,
            events,
            sessions,
        }
    }

    /// All notes of a workspace, most recently edited first
    pub async fn list_notes(&self, actor: &Actor, workspace_id: &Uuid) -> Result<Vec<Note>> {
        ensure_member(actor, workspace_id)?;

        Ok(self.storage.find_all_notes_by_workspace(workspace_id).await?)
    }

    /// Notes with the query in their title or any block, ignoring case
    pub async fn search_notes(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        query: &str,
    ) -> Result<Vec<Note>> {
        ensure_member(actor, workspace_id)?;

        let query = query.trim().to_lowercase();

        if query.is_empty() {
            return Ok(Vec::new());
        }

        let notes = self.storage.find_all_notes_by_workspace(workspace_id).await?;

        Ok(notes.into_iter().filter(|note| note.matches(&query)).collect())
    }

    /// A single note
    pub async fn get_note(&self, actor: &Actor, workspace_id: &Uuid, note_id: &Uuid) -> Result<Note> {
        ensure_member(actor, workspace_id)?;

        let note = self
            .storage
            .find_single_note_by_id(note_id)
            .await?
            .ok_or(Error::NotFound("Note not found"))?;

        if &note.workspace_id != workspace_id {
            return Err(Error::Forbidden("You do not have access to this note"));
        }

        Ok(note)
    }

    /// Create a note at version 1
    pub async fn create_note(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        values: CreateNote,
    ) -> Result<Note> {
        ensure_member(actor, workspace_id)?;

        let title = values
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let blocks = match values.blocks {
            Some(drafts) if !drafts.is_empty() => {
                materialize(&drafts).map_err(|err| Error::Invalid(err.to_string()))?
            }
            _ => default_blocks(),
        };

        let note = self
            .storage
            .create_note(&CreateNoteValues {
                workspace_id,
                actor,
                title: &title,
                blocks,
            })
            .await?;

        tracing::debug!("Note {} created by {}", note.id, actor.name);

        Ok(note)
    }

    /// Update title and/or blocks of a note, guarded by the version it is based on
    pub async fn update_note(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        values: UpdateNote,
    ) -> Result<UpdatePlan> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        let change = NoteChange::edit(actor.id, values.version, values.title, values.blocks);

        self.commit(actor, &note, &change).await
    }

    /// Delete a note with its blocks, revisions, comments and share link
    pub async fn delete_note(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<Note> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        self.storage.delete_note(&note).await?;
        self.sessions.close_note(&note.id).await;

        tracing::debug!("Note {} deleted by {}", note.id, actor.name);

        Ok(note)
    }

    /// All revisions of a note, newest first
    pub async fn list_revisions(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<Vec<Revision>> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        Ok(self.storage.find_all_revisions_by_note(&note.id).await?)
    }

    /// A single revision of a note
    pub async fn get_revision(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        revision_id: &Uuid,
    ) -> Result<Revision> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        self.find_revision(&note, revision_id).await
    }

    /// Bring a note back to the blocks of a revision
    ///
    /// The blocks that are overwritten are recorded as a revision first
    pub async fn restore_revision(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        revision_id: &Uuid,
    ) -> Result<Restored> {
        let note = self.get_note(actor, workspace_id, note_id).await?;
        let revision = self.find_revision(&note, revision_id).await?;

        let change = restore_change(&note, &revision, actor.id);
        let plan = self.commit(actor, &note, &change).await?;

        tracing::debug!(
            "Note {} restored to version {} by {}",
            note.id,
            revision.version,
            actor.name
        );

        Ok(Restored {
            note: plan.note,
            restored_from: revision.version,
        })
    }

    /// The activity of a workspace, newest first
    pub async fn list_activity(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Activity>> {
        ensure_member(actor, workspace_id)?;

        let (limit, offset) = page(limit, offset);

        Ok(self
            .storage
            .find_all_activity_by_workspace(workspace_id, limit, offset)
            .await?)
    }

    /// The activity of a single note, newest first
    pub async fn list_note_activity(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Activity>> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        let (limit, offset) = page(limit, offset);

        Ok(self
            .storage
            .find_all_activity_by_note(&note.id, limit, offset)
            .await?)
    }

    /// Share a note with anyone holding the token of the link
    ///
    /// A note that is already shared gets a new token, the old one stops working
    pub async fn share_note(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        expires_at: Option<NaiveDateTime>,
    ) -> Result<ShareLink> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        if expires_at.is_some_and(|expires_at| expires_at <= Utc::now().naive_utc()) {
            return Err(Error::InvalidValue("Expiry date must be in the future"));
        }

        let token = generate_token();

        let share_link = self
            .storage
            .save_share_link(&ShareLinkValues {
                note: &note,
                actor,
                token: &token,
                expires_at,
            })
            .await?;

        tracing::debug!("Note {} shared by {}", note.id, actor.name);

        Ok(share_link)
    }

    /// The share link of a note
    pub async fn get_share_link(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<ShareLink> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        self.storage
            .find_share_link_by_note(&note.id)
            .await?
            .ok_or(Error::NotFound("Note is not shared"))
    }

    /// Stop sharing a note, its token stops working
    pub async fn unshare_note(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<()> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        if self.storage.delete_share_link(&note.id).await? {
            tracing::debug!("Note {} no longer shared by {}", note.id, actor.name);

            Ok(())
        } else {
            Err(Error::NotFound("Note is not shared"))
        }
    }

    /// A note read through its share link, no actor involved
    pub async fn get_shared_note(&self, token: &str) -> Result<Note> {
        let share_link = self
            .storage
            .find_share_link_by_token(token)
            .await?
            .ok_or(Error::NotFound("Shared note not found"))?;

        if share_link.is_expired(Utc::now().naive_utc()) {
            return Err(Error::NotFound("Share link has expired"));
        }

        self.storage
            .find_single_note_by_id(&share_link.note_id)
            .await?
            .ok_or(Error::NotFound("Shared note not found"))
    }

    /// All comments on a note, newest first
    pub async fn list_comments(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<Vec<Comment>> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        Ok(self.storage.find_all_comments_by_note(&note.id).await?)
    }

    /// Comment on a note, or on one of its blocks
    pub async fn create_comment(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        values: CreateComment,
    ) -> Result<Comment> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        if values.content.trim().is_empty() {
            return Err(Error::InvalidValue("Comment can not be empty"));
        }

        if values
            .block_id
            .is_some_and(|block_id| !note.blocks.iter().any(|block| block.id == block_id))
        {
            return Err(Error::InvalidValue("Block not found in note"));
        }

        let comment = self
            .storage
            .create_comment(&CreateCommentValues {
                note: &note,
                actor,
                block_id: values.block_id,
                content: &values.content,
            })
            .await?;

        tracing::debug!("Comment {} placed on note {} by {}", comment.id, note.id, actor.name);

        Ok(comment)
    }

    /// Mark a comment as resolved by the actor
    pub async fn resolve_comment(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<Comment> {
        self.update_comment_resolution(actor, workspace_id, note_id, comment_id, true)
            .await
    }

    /// Open a resolved comment again
    pub async fn reopen_comment(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<Comment> {
        self.update_comment_resolution(actor, workspace_id, note_id, comment_id, false)
            .await
    }

    /// Delete a comment, only by its author
    pub async fn delete_comment(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        comment_id: &Uuid,
    ) -> Result<Comment> {
        let note = self.get_note(actor, workspace_id, note_id).await?;
        let comment = self.find_comment(&note, comment_id).await?;

        if comment.author_id != actor.id {
            return Err(Error::Forbidden("Cannot delete this comment"));
        }

        self.storage.delete_comment(&comment).await?;

        Ok(comment)
    }

    /// Notifications about a note
    pub async fn subscribe(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<NoteSubscription> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        Ok(self.events.subscribe(note.id))
    }

    /// Open a note for an actor
    pub async fn join(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<Participant> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        Ok(self.sessions.join(actor, note.id).await)
    }

    /// Close a connection of the actor on a note
    pub async fn leave(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        connection_id: &ConnectionId,
    ) -> Result<Participant> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        self.sessions
            .leave(actor, connection_id)
            .await
            .filter(|participant| participant.note_id == note.id)
            .ok_or(Error::NotFound("Connection not found"))
    }

    /// Everyone with a note open
    pub async fn participants(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
    ) -> Result<Vec<Participant>> {
        let note = self.get_note(actor, workspace_id, note_id).await?;

        Ok(self.sessions.participants(&note.id).await)
    }

    /// A revision, only when it belongs to the note
    async fn find_revision(&self, note: &Note, revision_id: &Uuid) -> Result<Revision> {
        self.storage
            .find_single_revision_by_id(revision_id)
            .await?
            .filter(|revision| revision.note_id == note.id)
            .ok_or(Error::NotFound("Revision not found"))
    }

    /// A comment, only when it belongs to the note
    async fn find_comment(&self, note: &Note, comment_id: &Uuid) -> Result<Comment> {
        self.storage
            .find_single_comment_by_id(comment_id)
            .await?
            .filter(|comment| comment.note_id == note.id)
            .ok_or(Error::NotFound("Comment not found"))
    }

    /// Resolve or reopen a comment of a note
    async fn update_comment_resolution(
        &self,
        actor: &Actor,
        workspace_id: &Uuid,
        note_id: &Uuid,
        comment_id: &Uuid,
        resolved: bool,
    ) -> Result<Comment> {
        let note = self.get_note(actor, workspace_id, note_id).await?;
        let comment = self.find_comment(&note, comment_id).await?;

        self.storage
            .update_comment_resolution(&comment, resolved.then_some(actor))
            .await?
            .ok_or(Error::NotFound("Comment not found"))
    }

    /// Commit a change and publish what it did
    async fn commit(&self, actor: &Actor, note: &Note, change: &NoteChange) -> Result<UpdatePlan> {
        let plan = match self.storage.commit_note_change(&note.id, change).await? {
            Commit::Applied(plan) => plan,
            Commit::NotFound => return Err(Error::NotFound("Note not found")),
            Commit::Rejected(err) => return Err(err.into()),
        };

        tracing::debug!(
            "Note {} is at version {} after a change by {}",
            plan.note.id,
            plan.note.version,
            actor.name
        );

        self.events.publish(plan.events.clone());

        Ok(plan)
    }
}

/// Paging with defaults applied, never negative
fn page(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).max(0),
        offset.unwrap_or(0).max(0),
    )
}

/// The actor must be a member of the workspace
fn ensure_member(actor: &Actor, workspace_id: &Uuid) -> Result<()> {
    if actor.is_member_of(workspace_id) {
        Ok(())
    } else {
        Err(Error::Forbidden("You do not have access to this workspace"))
    }
}

//! All things related to the storage of notes, revisions and activity

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::activity::Activity;
use crate::activity::ActivityEntry;
use crate::actors::Actor;
use crate::blocks::Block;
use crate::comments::Comment;
use crate::notes::Note;
use crate::pipeline::NoteChange;
use crate::pipeline::PlanError;
use crate::pipeline::UpdatePlan;
use crate::revisions::Revision;
use crate::shares::ShareLink;

pub use memory::Memory;
#[cfg(feature = "postgres")]
pub use postgres::Postgres;

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// Storage configuration
pub enum Config {
    /// Keep everything in memory, gone on shutdown
    Memory,

    /// Connect to Postgres using `DATABASE_URL`
    #[cfg(feature = "postgres")]
    DetectConfig,

    /// Use an existing Postgres pool
    #[cfg(feature = "postgres")]
    ExistingConnection(sqlx::PgPool),
}

impl Config {
    /// The storage this build is meant to run with
    pub fn from_env() -> Self {
        #[cfg(feature = "postgres")]
        return Self::DetectConfig;

        #[cfg(not(feature = "postgres"))]
        Self::Memory
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a Note
pub struct CreateNoteValues<'a> {
    /// Workspace the note belongs to
    pub workspace_id: &'a Uuid,

    /// Actor creating the note
    pub actor: &'a Actor,

    /// Title of the note
    pub title: &'a str,

    /// Initial blocks, never empty
    pub blocks: Vec<Block>,
}

/// Values to share a Note with
pub struct ShareLinkValues<'a> {
    /// The note to share
    pub note: &'a Note,

    /// Actor sharing the note
    pub actor: &'a Actor,

    /// Secret token of the link
    pub token: &'a str,

    /// After this the link stops working
    pub expires_at: Option<NaiveDateTime>,
}

/// Values to create a Comment
pub struct CreateCommentValues<'a> {
    /// The note to comment on
    pub note: &'a Note,

    /// Author of the comment
    pub actor: &'a Actor,

    /// Block to anchor the comment to
    pub block_id: Option<Uuid>,

    /// The comment itself
    pub content: &'a str,
}

/// The outcome of committing a change to a note
#[derive(Debug)]
pub enum Commit {
    /// Everything in the plan is persisted
    Applied(UpdatePlan),

    /// The note does not exist (anymore)
    NotFound,

    /// Nothing is persisted
    Rejected(PlanError),
}

/// Storage with all supported operations
#[async_trait]
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find all notes of a workspace, most recently edited first
    async fn find_all_notes_by_workspace(&self, workspace_id: &Uuid) -> Result<Vec<Note>>;

    /// Find a single note with its blocks
    async fn find_single_note_by_id(&self, note_id: &Uuid) -> Result<Option<Note>>;

    /// Create a note at version 1
    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note>;

    /// Apply a change atomically
    ///
    /// The current note is read and the change planned within the same transaction as the
    /// writes, a plan that is rejected leaves everything untouched
    async fn commit_note_change(&self, note_id: &Uuid, change: &NoteChange) -> Result<Commit>;

    /// Delete a note with its blocks, revisions, comments and share link
    async fn delete_note(&self, note: &Note) -> Result<()>;

    /// Find all revisions of a note, newest first
    async fn find_all_revisions_by_note(&self, note_id: &Uuid) -> Result<Vec<Revision>>;

    /// Find a single revision
    async fn find_single_revision_by_id(&self, revision_id: &Uuid) -> Result<Option<Revision>>;

    /// Share a note, replacing the link it may already have
    async fn save_share_link(&self, values: &ShareLinkValues) -> Result<ShareLink>;

    /// Find the share link of a note
    async fn find_share_link_by_note(&self, note_id: &Uuid) -> Result<Option<ShareLink>>;

    /// Find a share link by its token
    async fn find_share_link_by_token(&self, token: &str) -> Result<Option<ShareLink>>;

    /// Stop sharing a note
    ///
    /// Returns `false` when the note was not shared
    async fn delete_share_link(&self, note_id: &Uuid) -> Result<bool>;

    /// Create a comment on a note
    async fn create_comment(&self, values: &CreateCommentValues) -> Result<Comment>;

    /// Find all comments of a note, newest first
    async fn find_all_comments_by_note(&self, note_id: &Uuid) -> Result<Vec<Comment>>;

    /// Find a single comment
    async fn find_single_comment_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>>;

    /// Mark a comment as resolved by the actor, or reopen it without one
    ///
    /// Returns `None` when the comment is gone
    async fn update_comment_resolution(
        &self,
        comment: &Comment,
        resolved_by: Option<&Actor>,
    ) -> Result<Option<Comment>>;

    /// Delete a comment
    async fn delete_comment(&self, comment: &Comment) -> Result<()>;

    /// Register an action on the activity log
    async fn register_activity(
        &self,
        actor: &Actor,
        entry: &ActivityEntry,
        ip_address: Option<&IpAddr>,
    ) -> Result<()>;

    /// Find the activity of a workspace, newest first
    async fn find_all_activity_by_workspace(
        &self,
        workspace_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>>;

    /// Find the activity of a single note, newest first
    async fn find_all_activity_by_note(
        &self,
        note_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>>;
}

//! Notes API endpoints
//!
//! Everything related to notes and their blocks

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::blocks::Block;
use crate::blocks::BlockDraft;
use crate::notes::Note;
use crate::service::CreateNote;
use crate::service::NoteService;
use crate::service::UpdateNote;
use crate::storage::Storage;

use super::ActivityLog;
use super::CurrentActor;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;

/// Note response going to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    /// Note ID
    pub id: Uuid,

    /// Workspace the note belongs to
    pub workspace_id: Uuid,

    /// Title
    pub title: String,

    /// Blocks, in order
    pub blocks: Vec<Block>,

    /// Version to base the next update on
    pub version: i64,

    /// Creator
    pub created_by: Uuid,

    /// Last editor
    pub last_edited_by: Uuid,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last edited at
    pub last_edited_at: NaiveDateTime,
}

impl NoteResponse {
    /// Create a response from a [`Note`](Note)
    pub fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            workspace_id: note.workspace_id,
            title: note.title,
            blocks: note.blocks,
            version: note.version,
            created_by: note.created_by,
            last_edited_by: note.last_edited_by,
            created_at: note.created_at,
            last_edited_at: note.last_edited_at,
        }
    }

    /// Create a response from multiple [`Note`](Note)s
    fn from_note_multiple(notes: Vec<Note>) -> Vec<Self> {
        notes.into_iter().map(Self::from_note).collect()
    }
}

/// List all notes of a workspace, most recently edited first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/workspaces/<uuid>/notes
/// ```
pub async fn list<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters(workspace_id): PathParameters<Uuid>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = service.list_notes(&current_actor, &workspace_id).await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// Search query
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Text to look for in titles and blocks
    q: Option<String>,
}

/// Search the notes of a workspace
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/workspaces/<uuid>/notes/search?q=groceries'
/// ```
pub async fn search<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters(workspace_id): PathParameters<Uuid>,
    QueryParameters(query): QueryParameters<SearchQuery>,
) -> Result<Success<Vec<NoteResponse>>, Error> {
    let notes = service
        .search_notes(
            &current_actor,
            &workspace_id,
            query.q.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Success::ok(NoteResponse::from_note_multiple(notes)))
}

/// Get a single note with its blocks
pub async fn single<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<NoteResponse>, Error> {
    let note = service
        .get_note(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::ok(NoteResponse::from_note(note)))
}

/// Create note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteForm {
    /// Title, "Untitled Note" when missing
    title: Option<String>,

    /// Initial blocks, a single empty paragraph when missing or empty
    blocks: Option<Vec<BlockDraft>>,
}

/// Create a note based on the [`CreateNoteForm`](CreateNoteForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "title": "Groceries", "blocks": [ { "type": "checkbox", "content": "Milk" } ] }' \
///     http://localhost:6000/api/workspaces/<uuid>/notes
/// ```
pub async fn create<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters(workspace_id): PathParameters<Uuid>,
    Form(form): Form<CreateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let values = CreateNote {
        title: form.title,
        blocks: form.blocks,
    };

    let note = service
        .create_note(&current_actor, &workspace_id, values)
        .await?;

    activity_log.register(ActivityEntry::CreateNote(&note)).await;

    Ok(Success::created(NoteResponse::from_note(note)))
}

/// Update note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteForm {
    /// New title
    title: Option<String>,

    /// New blocks, replacing all current blocks unless empty
    blocks: Option<Vec<BlockDraft>>,

    /// The version the client based its changes on
    version: i64,
}

/// Update a note based on the [`UpdateNoteForm`](UpdateNoteForm) form
///
/// Responds with `409 Conflict` when the note moved past `version`, the response then holds the
/// current state of the note under `conflict`.
///
/// Request:
/// ```sh
/// curl -v -X PATCH -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "version": 3, "blocks": [ { "content": "A2" } ] }' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>
/// ```
pub async fn update<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
    Form(form): Form<UpdateNoteForm>,
) -> Result<Success<NoteResponse>, Error> {
    let values = UpdateNote {
        title: form.title,
        blocks: form.blocks,
        version: form.version,
    };

    let plan = service
        .update_note(&current_actor, &workspace_id, &note_id, values)
        .await?;

    if plan.blocks_replaced {
        activity_log
            .register(ActivityEntry::EditNote(&plan.note))
            .await;
    }

    if plan.title_changed {
        activity_log
            .register(ActivityEntry::RenameNote(&plan.note))
            .await;
    }

    Ok(Success::ok(NoteResponse::from_note(plan.note)))
}

/// Delete a note, with its blocks and revisions
pub async fn delete<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<&'static str>, Error> {
    let note = service
        .delete_note(&current_actor, &workspace_id, &note_id)
        .await?;

    activity_log.register(ActivityEntry::DeleteNote(&note)).await;

    Ok(Success::<&'static str>::no_content())
}

//! Share link API endpoints
//!
//! Reading a shared note needs nothing but its token

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::blocks::Block;
use crate::notes::Note;
use crate::service::NoteService;
use crate::shares::ShareLink;
use crate::storage::Storage;

use super::CurrentActor;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Share link response going to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLinkResponse {
    /// Secret token
    pub token: String,

    /// Where the shared note can be read
    pub url: String,

    /// Shared by
    pub created_by: Uuid,

    /// Shared at
    pub created_at: NaiveDateTime,

    /// The link stops working after this
    pub expires_at: Option<NaiveDateTime>,
}

impl ShareLinkResponse {
    /// Create a response from a [`ShareLink`](ShareLink)
    fn from_share_link(share_link: ShareLink) -> Self {
        Self {
            url: share_link.url(),
            token: share_link.token,
            created_by: share_link.created_by,
            created_at: share_link.created_at,
            expires_at: share_link.expires_at,
        }
    }
}

/// A shared note, without anything about the workspace
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedNoteResponse {
    /// Note ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Blocks, in order
    pub blocks: Vec<Block>,

    /// Last edited at
    pub last_edited_at: NaiveDateTime,
}

impl SharedNoteResponse {
    /// Create a response from a [`Note`](Note)
    fn from_note(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            blocks: note.blocks,
            last_edited_at: note.last_edited_at,
        }
    }
}

/// Share note form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareNoteForm {
    /// The link stops working after this, never when missing
    expires_at: Option<NaiveDateTime>,
}

/// Share a note, a note that is already shared gets a new token
///
/// Request:
/// ```sh
/// curl -v -X POST -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "expiresAt": "2026-12-31T00:00:00" }' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/share
/// ```
pub async fn create<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
    Form(form): Form<ShareNoteForm>,
) -> Result<Success<ShareLinkResponse>, Error> {
    let share_link = service
        .share_note(&current_actor, &workspace_id, &note_id, form.expires_at)
        .await?;

    Ok(Success::created(ShareLinkResponse::from_share_link(share_link)))
}

/// Get the share link of a note
pub async fn single<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<ShareLinkResponse>, Error> {
    let share_link = service
        .get_share_link(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::ok(ShareLinkResponse::from_share_link(share_link)))
}

/// Stop sharing a note
pub async fn delete<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<&'static str>, Error> {
    service
        .unshare_note(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::<&'static str>::no_content())
}

/// Read a shared note
///
/// Request:
/// ```sh
/// curl -v http://localhost:6000/api/share/<token>
/// ```
pub async fn shared<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    PathParameters(token): PathParameters<String>,
) -> Result<Success<SharedNoteResponse>, Error> {
    let note = service.get_shared_note(&token).await?;

    Ok(Success::ok(SharedNoteResponse::from_note(note)))
}

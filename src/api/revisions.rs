//! Revisions API endpoints
//!
//! History of a note and restoring it

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::blocks::Block;
use crate::revisions::Revision;
use crate::service::NoteService;
use crate::storage::Storage;

use super::ActivityLog;
use super::CurrentActor;
use super::Error;
use super::PathParameters;
use super::Success;
use super::notes::NoteResponse;

/// Revision response going to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponse {
    /// Revision ID
    pub id: Uuid,

    /// The version of the note this snapshot belongs to
    pub version: i64,

    /// Blocks at that version
    pub blocks: Vec<Block>,

    /// Recorded at
    pub created_at: NaiveDateTime,

    /// Recorded for
    pub created_by: Uuid,
}

impl RevisionResponse {
    /// Create a response from a [`Revision`](Revision)
    fn from_revision(revision: Revision) -> Self {
        Self {
            id: revision.id,
            version: revision.version,
            blocks: revision.blocks,
            created_at: revision.created_at,
            created_by: revision.created_by,
        }
    }
}

/// List all revisions of a note, newest first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/revisions
/// ```
pub async fn list<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<Vec<RevisionResponse>>, Error> {
    let revisions = service
        .list_revisions(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::ok(
        revisions
            .into_iter()
            .map(RevisionResponse::from_revision)
            .collect(),
    ))
}

/// Get a single revision
pub async fn single<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, revision_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<RevisionResponse>, Error> {
    let revision = service
        .get_revision(&current_actor, &workspace_id, &note_id, &revision_id)
        .await?;

    Ok(Success::ok(RevisionResponse::from_revision(revision)))
}

/// Restore a note to the blocks of a revision
///
/// Request:
/// ```sh
/// curl -v -X POST -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/revisions/<uuid>/restore
/// ```
pub async fn restore<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, revision_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<NoteResponse>, Error> {
    let restored = service
        .restore_revision(&current_actor, &workspace_id, &note_id, &revision_id)
        .await?;

    activity_log
        .register(ActivityEntry::RestoreVersion(
            &restored.note,
            restored.restored_from,
        ))
        .await;

    Ok(Success::ok(NoteResponse::from_note(restored.note)))
}

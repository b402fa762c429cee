//! Activity API endpoints

use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::activity::Activity;
use crate::service::NoteService;
use crate::storage::Storage;

use super::CurrentActor;
use super::Error;
use super::PathParameters;
use super::QueryParameters;
use super::Success;

/// Paging of the activity log
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    /// Amount of entries, 50 by default
    limit: Option<i64>,

    /// Entries to skip
    offset: Option<i64>,
}

/// The activity of a workspace, newest first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/workspaces/<uuid>/activity?limit=10'
/// ```
pub async fn list<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters(workspace_id): PathParameters<Uuid>,
    QueryParameters(query): QueryParameters<ActivityQuery>,
) -> Result<Success<Vec<Activity>>, Error> {
    let activity = service
        .list_activity(&current_actor, &workspace_id, query.limit, query.offset)
        .await?;

    Ok(Success::ok(activity))
}

/// The activity of a single note, newest first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/activity
/// ```
pub async fn list_for_note<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
    QueryParameters(query): QueryParameters<ActivityQuery>,
) -> Result<Success<Vec<Activity>>, Error> {
    let activity = service
        .list_note_activity(
            &current_actor,
            &workspace_id,
            &note_id,
            query.limit,
            query.offset,
        )
        .await?;

    Ok(Success::ok(activity))
}

//! Participants API endpoints
//!
//! Who has a note open

use axum::Extension;
use uuid::Uuid;

use crate::realtime::Participant;
use crate::service::NoteService;
use crate::storage::Storage;

use super::CurrentActor;
use super::Error;
use super::PathParameters;
use super::Success;

/// Everyone with the note open, in order of joining
pub async fn list<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<Vec<Participant>>, Error> {
    let participants = service
        .participants(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::ok(participants))
}

/// Open the note, the response holds the connection ID to leave with
pub async fn join<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<Participant>, Error> {
    let participant = service
        .join(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::created(participant))
}

/// Close the note for a connection
pub async fn leave<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, connection_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<&'static str>, Error> {
    service
        .leave(&current_actor, &workspace_id, &note_id, &connection_id)
        .await?;

    Ok(Success::<&'static str>::no_content())
}

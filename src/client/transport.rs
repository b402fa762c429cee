//! How a client gets its saves to the server

use async_trait::async_trait;
use chrono::naive::NaiveDateTime;
use thiserror::Error;
use uuid::Uuid;

use crate::actors::Actor;
use crate::blocks::Block;
use crate::guard::Conflict;
use crate::notes::Note;
use crate::realtime::NoteSubscription;
use crate::service;
use crate::service::NoteService;
use crate::service::UpdateNote;
use crate::storage::Storage;

use super::SaveRequest;

/// The state of a note on the server, as reported with a conflict
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSnapshot {
    /// Current version on the server
    pub version: i64,

    /// Current title on the server
    pub title: String,

    /// Current blocks on the server
    pub blocks: Vec<Block>,

    /// Who made the current version
    pub last_edited_by: Uuid,

    /// When the current version was made
    pub last_edited_at: NaiveDateTime,
}

impl From<Conflict> for RemoteSnapshot {
    fn from(conflict: Conflict) -> Self {
        Self {
            version: conflict.current_version,
            title: conflict.current_title,
            blocks: conflict.current_blocks,
            last_edited_by: conflict.last_edited_by,
            last_edited_at: conflict.last_edited_at,
        }
    }
}

/// Why a save did not go through
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Someone else saved first, needs a decision from the user
    #[error("Note has been modified by another user")]
    Conflict(Box<RemoteSnapshot>),

    /// The server refused the save for good, like a deleted note or lost access
    #[error("{0}")]
    Rejected(String),

    /// Anything that might work next time
    #[error("{0}")]
    Transient(String),
}

impl From<service::Error> for TransportError {
    fn from(err: service::Error) -> Self {
        match err {
            service::Error::Conflict(conflict) => Self::Conflict(Box::new((*conflict).into())),
            service::Error::Storage(err) => Self::Transient(err.to_string()),
            err @ (service::Error::NotFound(_)
            | service::Error::Forbidden(_)
            | service::Error::Invalid(_)
            | service::Error::InvalidValue(_)) => Self::Rejected(err.to_string()),
        }
    }
}

/// A way to save notes and hear about changes
#[async_trait]
pub trait NoteTransport: Send + Sync + 'static {
    /// The actor the transport saves as
    fn actor_id(&self) -> Uuid;

    /// Save title and blocks, guarded by the version in the request
    async fn save(&self, request: &SaveRequest) -> Result<Note, TransportError>;

    /// Notifications about a note, when the transport has them
    async fn subscribe(&self, _note_id: &Uuid) -> Option<NoteSubscription> {
        None
    }
}

/// Transport talking to a note service in the same process
#[derive(Clone, Debug)]
pub struct LocalTransport<S: Storage> {
    /// The service saves go to
    service: NoteService<S>,

    /// Who is saving
    actor: Actor,

    /// The workspace of the notes
    workspace_id: Uuid,
}

impl<S: Storage> LocalTransport<S> {
    /// Create a transport saving as `actor` in a workspace
    pub fn new(service: NoteService<S>, actor: Actor, workspace_id: Uuid) -> Self {
        Self {
            service,
            actor,
            workspace_id,
        }
    }
}

#[async_trait]
impl<S: Storage> NoteTransport for LocalTransport<S> {
    fn actor_id(&self) -> Uuid {
        self.actor.id
    }

    async fn save(&self, request: &SaveRequest) -> Result<Note, TransportError> {
        let values = UpdateNote {
            title: Some(request.title.clone()),
            blocks: Some(request.blocks.clone()),
            version: request.version,
        };

        let plan = self
            .service
            .update_note(&self.actor, &self.workspace_id, &request.note_id, values)
            .await?;

        Ok(plan.note)
    }

    async fn subscribe(&self, note_id: &Uuid) -> Option<NoteSubscription> {
        match self
            .service
            .subscribe(&self.actor, &self.workspace_id, note_id)
            .await
        {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                tracing::warn!("Could not subscribe to note {note_id}: {err}");

                None
            }
        }
    }
}

//! Realtime notifications and presence
//!
//! Notifications are best-effort: they tell clients that something changed so they can refetch,
//! they are never a source to merge from. The versioned update path stays the authority.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use chrono::naive::NaiveDateTime;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::actors::Actor;
use crate::blocks::Block;
use crate::notes::Note;

/// Default amount of events a subscriber may fall behind before skipping
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A block of a note changed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum NoteEvent {
    /// A block was added
    BlockAdded {
        note_id: Uuid,
        block_id: Uuid,
        version: i64,
        editor: Uuid,
    },

    /// Content, type, checked state or position of a block changed
    BlockChanged {
        note_id: Uuid,
        block_id: Uuid,
        version: i64,
        editor: Uuid,
    },

    /// A block was removed
    BlockDeleted {
        note_id: Uuid,
        block_id: Uuid,
        version: i64,
        editor: Uuid,
    },
}

impl NoteEvent {
    /// The note the event is about
    pub fn note_id(&self) -> Uuid {
        match self {
            Self::BlockAdded { note_id, .. }
            | Self::BlockChanged { note_id, .. }
            | Self::BlockDeleted { note_id, .. } => *note_id,
        }
    }

    /// The actor that caused the event
    pub fn editor(&self) -> Uuid {
        match self {
            Self::BlockAdded { editor, .. }
            | Self::BlockChanged { editor, .. }
            | Self::BlockDeleted { editor, .. } => *editor,
        }
    }

    /// The note version after the change
    pub fn version(&self) -> i64 {
        match self {
            Self::BlockAdded { version, .. }
            | Self::BlockChanged { version, .. }
            | Self::BlockDeleted { version, .. } => *version,
        }
    }
}

/// Events for replacing the blocks of `before` with `after`, matched by block ID
pub fn diff_blocks(before: &Note, after: &[Block], version: i64, editor: Uuid) -> Vec<NoteEvent> {
    let note_id = before.id;
    let previous = before
        .blocks
        .iter()
        .map(|block| (block.id, block))
        .collect::<HashMap<_, _>>();

    let mut events = after
        .iter()
        .filter_map(|block| match previous.get(&block.id) {
            None => Some(NoteEvent::BlockAdded {
                note_id,
                block_id: block.id,
                version,
                editor,
            }),
            Some(old) if !old.same_content(block) || old.position != block.position => {
                Some(NoteEvent::BlockChanged {
                    note_id,
                    block_id: block.id,
                    version,
                    editor,
                })
            }
            Some(_) => None,
        })
        .collect::<Vec<_>>();

    events.extend(
        before
            .blocks
            .iter()
            .filter(|old| !after.iter().any(|block| block.id == old.id))
            .map(|old| NoteEvent::BlockDeleted {
                note_id,
                block_id: old.id,
                version,
                editor,
            }),
    );

    events
}

/// Fan-out of note events to every subscriber
#[derive(Clone, Debug)]
pub struct EventHub {
    /// Broadcast sender, receivers are created per subscription
    sender: broadcast::Sender<NoteEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventHub {
    /// Create a hub where subscribers may lag `capacity` events behind
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self { sender }
    }

    /// Publish events, nobody listening is fine
    pub fn publish(&self, events: Vec<NoteEvent>) {
        for event in events {
            if self.sender.send(event).is_err() {
                tracing::trace!("No subscribers for note event");
            }
        }
    }

    /// Subscribe to the events of a single note
    pub fn subscribe(&self, note_id: Uuid) -> NoteSubscription {
        NoteSubscription {
            note_id,
            receiver: self.sender.subscribe(),
        }
    }
}

/// Events of a single note
#[derive(Debug)]
pub struct NoteSubscription {
    /// The note subscribed to
    note_id: Uuid,

    /// Receiving end of the hub
    receiver: broadcast::Receiver<NoteEvent>,
}

impl NoteSubscription {
    /// The note subscribed to
    pub fn note_id(&self) -> Uuid {
        self.note_id
    }

    /// Wait for the next event of the note
    ///
    /// Missed events are skipped, `None` once the hub is gone
    pub async fn recv(&mut self) -> Option<NoteEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.note_id() == self.note_id => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        "Subscription for note {} skipped {skipped} events",
                        self.note_id
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Identifier of a realtime connection
pub type ConnectionId = Uuid;

/// Someone with a note open
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// The connection
    pub connection_id: ConnectionId,

    /// The actor behind the connection
    pub actor_id: Uuid,

    /// Display name of the actor
    pub name: String,

    /// The note that is open
    pub note_id: Uuid,

    /// When the note was opened
    pub joined_at: NaiveDateTime,
}

/// Who has which note open, keyed by connection
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    /// All known connections
    sessions: Arc<Mutex<HashMap<ConnectionId, Participant>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection for an actor on a note
    pub async fn join(&self, actor: &Actor, note_id: Uuid) -> Participant {
        let participant = Participant {
            connection_id: Uuid::new_v4(),
            actor_id: actor.id,
            name: actor.name.clone(),
            note_id,
            joined_at: Utc::now().naive_utc(),
        };

        self.sessions
            .lock()
            .await
            .insert(participant.connection_id, participant.clone());

        tracing::debug!("{} joined note {note_id}", actor.name);

        participant
    }

    /// Remove a connection, only by the actor that owns it
    pub async fn leave(&self, actor: &Actor, connection_id: &ConnectionId) -> Option<Participant> {
        let mut sessions = self.sessions.lock().await;

        if sessions
            .get(connection_id)
            .is_some_and(|participant| participant.actor_id == actor.id)
        {
            sessions.remove(connection_id)
        } else {
            None
        }
    }

    /// Drop every connection on a note, e.g. when it is deleted
    pub async fn close_note(&self, note_id: &Uuid) {
        self.sessions
            .lock()
            .await
            .retain(|_, participant| &participant.note_id != note_id);
    }

    /// Everyone with the note open, in order of joining
    pub async fn participants(&self, note_id: &Uuid) -> Vec<Participant> {
        let mut participants = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|participant| &participant.note_id == note_id)
            .cloned()
            .collect::<Vec<_>>();

        participants.sort_by(|left, right| left.joined_at.cmp(&right.joined_at));

        participants
    }
}

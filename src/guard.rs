//! Version guard
//!
//! Decides whether a change based on a client's version may be applied. Storage backends run
//! the check inside the same critical section as the write that follows, so two writers racing
//! from the same version can never both pass.

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::blocks::Block;
use crate::notes::Note;

/// The stored version moved on, with everything needed to resolve it without another request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// The authoritative version
    pub current_version: i64,

    /// The version the client based its change on
    pub client_version: i64,

    /// The authoritative title
    pub current_title: String,

    /// The authoritative blocks
    pub current_blocks: Vec<Block>,

    /// Who made the change the client did not see
    pub last_edited_by: Uuid,

    /// When that change happened
    pub last_edited_at: NaiveDateTime,
}

impl Conflict {
    /// Conflict against the given stored note
    pub fn from_note(current: &Note, client_version: i64) -> Self {
        Self {
            current_version: current.version,
            client_version,
            current_title: current.title.clone(),
            current_blocks: current.blocks.clone(),
            last_edited_by: current.last_edited_by,
            last_edited_at: current.last_edited_at,
        }
    }
}

/// Check the expected version against the stored note
pub fn check(expected_version: i64, current: &Note) -> Result<(), Box<Conflict>> {
    if expected_version == current.version {
        Ok(())
    } else {
        tracing::debug!(
            "Version conflict on note {}: expected {expected_version}, stored {}",
            current.id,
            current.version
        );

        Err(Box::new(Conflict::from_note(current, expected_version)))
    }
}

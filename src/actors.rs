//! Actors
//!
//! The resolved identity behind a request. Accounts and login live elsewhere, an actor only
//! arrives here through a verified token.

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// The identity making a change
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Actor {
    /// Actor ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Workspaces the actor is a member of
    pub workspaces: Vec<Uuid>,
}

impl Actor {
    /// Is the actor a member of the workspace?
    pub fn is_member_of(&self, workspace_id: &Uuid) -> bool {
        self.workspaces.contains(workspace_id)
    }
}

//! Revisions
//!
//! Immutable snapshots of a note's blocks. Revisions are only ever appended, they disappear
//! together with their note and nothing else.

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::blocks::Block;

/// A stored revision
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Revision ID
    pub id: Uuid,

    /// The note this is a snapshot of
    pub note_id: Uuid,

    /// The snapshot itself
    pub blocks: Vec<Block>,

    /// The version of the note the snapshot belongs to
    pub version: i64,

    /// The actor that caused the revision
    pub created_by: Uuid,

    /// Creation date
    pub created_at: NaiveDateTime,
}

/// Values to record a revision
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRevision {
    /// The snapshot
    pub blocks: Vec<Block>,

    /// The version the snapshot belongs to
    pub version: i64,

    /// The actor that caused the revision
    pub created_by: Uuid,
}

/// Append-only revision log
///
/// Used by the memory storage, the Postgres storage keeps the same contract with a table.
#[derive(Clone, Debug, Default)]
pub struct RevisionLog {
    /// Entries in order of recording
    entries: Vec<Revision>,
}

impl RevisionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a single immutable entry
    pub fn record(
        &mut self,
        note_id: Uuid,
        revision: NewRevision,
        created_at: NaiveDateTime,
    ) -> Revision {
        let revision = Revision {
            id: Uuid::new_v4(),
            note_id,
            blocks: revision.blocks,
            version: revision.version,
            created_by: revision.created_by,
            created_at,
        };

        self.entries.push(revision.clone());

        revision
    }

    /// All entries of a note, newest first
    ///
    /// Recording order breaks ties between equal timestamps
    pub fn list(&self, note_id: &Uuid) -> Vec<Revision> {
        let mut revisions = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, revision)| &revision.note_id == note_id)
            .collect::<Vec<_>>();

        revisions.sort_by(|(left_index, left), (right_index, right)| {
            right
                .created_at
                .cmp(&left.created_at)
                .then(right_index.cmp(left_index))
        });

        revisions
            .into_iter()
            .map(|(_, revision)| revision.clone())
            .collect()
    }

    /// A single entry
    pub fn get(&self, revision_id: &Uuid) -> Option<Revision> {
        self.entries
            .iter()
            .find(|revision| &revision.id == revision_id)
            .cloned()
    }

    /// Drop every entry of a note, only for cascading note deletion
    pub fn remove_note(&mut self, note_id: &Uuid) {
        self.entries.retain(|revision| &revision.note_id != note_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;

    fn new_revision(version: i64) -> NewRevision {
        NewRevision {
            blocks: Vec::new(),
            version,
            created_by: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_list_newest_first() {
        let mut log = RevisionLog::new();
        let note_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        log.record(note_id, new_revision(2), now);
        log.record(note_id, new_revision(3), now + Duration::seconds(1));
        log.record(Uuid::new_v4(), new_revision(9), now);

        let versions = log
            .list(&note_id)
            .iter()
            .map(|revision| revision.version)
            .collect::<Vec<_>>();

        assert_eq!(vec![3, 2], versions);
    }

    #[test]
    fn test_list_breaks_ties_by_recording_order() {
        let mut log = RevisionLog::new();
        let note_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        log.record(note_id, new_revision(4), now);
        log.record(note_id, new_revision(2), now);

        let versions = log
            .list(&note_id)
            .iter()
            .map(|revision| revision.version)
            .collect::<Vec<_>>();

        assert_eq!(vec![2, 4], versions);
    }

    #[test]
    fn test_get_and_remove_note() {
        let mut log = RevisionLog::new();
        let note_id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        let revision = log.record(note_id, new_revision(2), now);

        assert_eq!(Some(revision.clone()), log.get(&revision.id));

        log.remove_note(&note_id);

        assert_eq!(None, log.get(&revision.id));
        assert!(log.list(&note_id).is_empty());
    }
}

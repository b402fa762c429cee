//! Notes

use chrono::naive::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::blocks::Block;

/// Title of a note created without one
pub const DEFAULT_TITLE: &str = "Untitled Note";

/// A note with all of its blocks
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note ID
    pub id: Uuid,

    /// Owning workspace
    pub workspace_id: Uuid,

    /// Title
    pub title: String,

    /// Blocks, ordered by position
    pub blocks: Vec<Block>,

    /// Optimistic-concurrency version, starts at 1
    pub version: i64,

    /// The actor that created the note
    pub created_by: Uuid,

    /// The actor that last changed the note
    pub last_edited_by: Uuid,

    /// Creation date
    pub created_at: NaiveDateTime,

    /// Last edited at
    pub last_edited_at: NaiveDateTime,
}

impl Note {
    /// Does the title or any block contain the (already lowercased) query?
    pub fn matches(&self, lowercase_query: &str) -> bool {
        self.title.to_lowercase().contains(lowercase_query)
            || self
                .blocks
                .iter()
                .any(|block| block.content.to_lowercase().contains(lowercase_query))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::blocks::BlockDraft;
    use crate::blocks::materialize;

    fn note(title: &str, contents: &[&str]) -> Note {
        let drafts = contents
            .iter()
            .map(|content| BlockDraft::paragraph(*content))
            .collect::<Vec<_>>();

        Note {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            title: title.to_string(),
            blocks: materialize(&drafts).unwrap(),
            version: 1,
            created_by: Uuid::new_v4(),
            last_edited_by: Uuid::new_v4(),
            created_at: Utc::now().naive_utc(),
            last_edited_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_matches_title_and_blocks() {
        let note = note("Weekly Sync", &["agenda", "Action ITEMS"]);

        assert!(note.matches("weekly"));
        assert!(note.matches("action items"));
        assert!(!note.matches("retro"));
    }
}

//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::activity::Activity;
use crate::activity::ActivityEntry;
use crate::actors::Actor;
use crate::comments::Comment;
use crate::comments::Resolution;
use crate::notes::Note;
use crate::pipeline::NoteChange;
use crate::pipeline::plan;
use crate::revisions::Revision;
use crate::revisions::RevisionLog;
use crate::shares::ShareLink;

use super::Commit;
use super::CreateCommentValues;
use super::CreateNoteValues;
use super::Result;
use super::ShareLinkValues;
use super::Storage;

/// Everything stored, behind a single lock so a commit is all-or-nothing
#[derive(Debug, Default)]
struct State {
    /// All notes, with their blocks
    notes: HashMap<Uuid, Note>,

    /// All revisions
    revisions: RevisionLog,

    /// Share links, by note
    share_links: HashMap<Uuid, ShareLink>,

    /// All comments, in order of creation
    comments: Vec<Comment>,

    /// The activity log, in order of registration
    activity: Vec<Activity>,
}

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All state
    state: Arc<Mutex<State>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for Memory {
    async fn find_all_notes_by_workspace(&self, workspace_id: &Uuid) -> Result<Vec<Note>> {
        let mut notes = self
            .state
            .lock()
            .await
            .notes
            .values()
            .filter(|note| &note.workspace_id == workspace_id)
            .cloned()
            .collect::<Vec<_>>();

        notes.sort_by(|left, right| right.last_edited_at.cmp(&left.last_edited_at));

        Ok(notes)
    }

    async fn find_single_note_by_id(&self, note_id: &Uuid) -> Result<Option<Note>> {
        Ok(self.state.lock().await.notes.get(note_id).cloned())
    }

    async fn create_note(&self, values: &CreateNoteValues) -> Result<Note> {
        let now = Utc::now().naive_utc();

        let note = Note {
            id: Uuid::new_v4(),
            workspace_id: *values.workspace_id,
            title: values.title.to_string(),
            blocks: values.blocks.clone(),
            version: 1,
            created_by: values.actor.id,
            last_edited_by: values.actor.id,
            created_at: now,
            last_edited_at: now,
        };

        self.state
            .lock()
            .await
            .notes
            .insert(note.id, note.clone());

        Ok(note)
    }

    async fn commit_note_change(&self, note_id: &Uuid, change: &NoteChange) -> Result<Commit> {
        let mut state = self.state.lock().await;

        let Some(current) = state.notes.get(note_id) else {
            return Ok(Commit::NotFound);
        };

        let now = Utc::now().naive_utc();

        let plan = match plan(current, change, now) {
            Ok(plan) => plan,
            Err(err) => return Ok(Commit::Rejected(err)),
        };

        if let Some(revision) = &plan.revision {
            state.revisions.record(*note_id, revision.clone(), now);
        }

        state.notes.insert(*note_id, plan.note.clone());

        Ok(Commit::Applied(plan))
    }

    async fn delete_note(&self, note: &Note) -> Result<()> {
        let mut state = self.state.lock().await;

        state.notes.remove(&note.id);
        state.revisions.remove_note(&note.id);
        state.share_links.remove(&note.id);
        state.comments.retain(|comment| comment.note_id != note.id);

        Ok(())
    }

    async fn find_all_revisions_by_note(&self, note_id: &Uuid) -> Result<Vec<Revision>> {
        Ok(self.state.lock().await.revisions.list(note_id))
    }

    async fn find_single_revision_by_id(&self, revision_id: &Uuid) -> Result<Option<Revision>> {
        Ok(self.state.lock().await.revisions.get(revision_id))
    }

    async fn save_share_link(&self, values: &ShareLinkValues) -> Result<ShareLink> {
        let share_link = ShareLink {
            note_id: values.note.id,
            token: values.token.to_string(),
            created_by: values.actor.id,
            created_at: Utc::now().naive_utc(),
            expires_at: values.expires_at,
        };

        self.state
            .lock()
            .await
            .share_links
            .insert(share_link.note_id, share_link.clone());

        Ok(share_link)
    }

    async fn find_share_link_by_note(&self, note_id: &Uuid) -> Result<Option<ShareLink>> {
        Ok(self.state.lock().await.share_links.get(note_id).cloned())
    }

    async fn find_share_link_by_token(&self, token: &str) -> Result<Option<ShareLink>> {
        Ok(self
            .state
            .lock()
            .await
            .share_links
            .values()
            .find(|share_link| share_link.token == token)
            .cloned())
    }

    async fn delete_share_link(&self, note_id: &Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .share_links
            .remove(note_id)
            .is_some())
    }

    async fn create_comment(&self, values: &CreateCommentValues) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            note_id: values.note.id,
            workspace_id: values.note.workspace_id,
            block_id: values.block_id,
            author_id: values.actor.id,
            content: values.content.to_string(),
            resolution: None,
            created_at: Utc::now().naive_utc(),
        };

        self.state.lock().await.comments.push(comment.clone());

        Ok(comment)
    }

    async fn find_all_comments_by_note(&self, note_id: &Uuid) -> Result<Vec<Comment>> {
        Ok(self
            .state
            .lock()
            .await
            .comments
            .iter()
            .rev()
            .filter(|comment| &comment.note_id == note_id)
            .cloned()
            .collect())
    }

    async fn find_single_comment_by_id(&self, comment_id: &Uuid) -> Result<Option<Comment>> {
        Ok(self
            .state
            .lock()
            .await
            .comments
            .iter()
            .find(|comment| &comment.id == comment_id)
            .cloned())
    }

    async fn update_comment_resolution(
        &self,
        comment: &Comment,
        resolved_by: Option<&Actor>,
    ) -> Result<Option<Comment>> {
        let mut state = self.state.lock().await;

        let Some(stored) = state
            .comments
            .iter_mut()
            .find(|stored| stored.id == comment.id)
        else {
            return Ok(None);
        };

        stored.resolution = resolved_by.map(|actor| Resolution {
            resolved_by: actor.id,
            resolved_at: Utc::now().naive_utc(),
        });

        Ok(Some(stored.clone()))
    }

    async fn delete_comment(&self, comment: &Comment) -> Result<()> {
        self.state
            .lock()
            .await
            .comments
            .retain(|stored| stored.id != comment.id);

        Ok(())
    }

    async fn register_activity(
        &self,
        actor: &Actor,
        entry: &ActivityEntry,
        ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        let activity = Activity {
            id: Uuid::new_v4(),
            action: entry.action(),
            workspace_id: entry.workspace_id(),
            note_id: entry.note_id(),
            actor_id: actor.id,
            metadata: entry.metadata(),
            ip_address: ip_address.copied(),
            created_at: Utc::now().naive_utc(),
        };

        self.state.lock().await.activity.push(activity);

        Ok(())
    }

    async fn find_all_activity_by_workspace(
        &self,
        workspace_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>> {
        let state = self.state.lock().await;

        Ok(activity_page(
            &state.activity,
            |activity| &activity.workspace_id == workspace_id,
            limit,
            offset,
        ))
    }

    async fn find_all_activity_by_note(
        &self,
        note_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Activity>> {
        let state = self.state.lock().await;

        Ok(activity_page(
            &state.activity,
            |activity| &activity.note_id == note_id,
            limit,
            offset,
        ))
    }
}

/// A page of the activity log matching `filter`, newest first
fn activity_page<F>(activity: &[Activity], filter: F, limit: i64, offset: i64) -> Vec<Activity>
where
    F: Fn(&Activity) -> bool,
{
    let limit = usize::try_from(limit).unwrap_or(0);
    let offset = usize::try_from(offset).unwrap_or(0);

    activity
        .iter()
        .rev()
        .filter(|activity| filter(activity))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

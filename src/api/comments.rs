//! Comments API endpoints

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::activity::ActivityEntry;
use crate::comments::Comment;
use crate::service::CreateComment;
use crate::service::NoteService;
use crate::storage::Storage;

use super::ActivityLog;
use super::CurrentActor;
use super::Error;
use super::Form;
use super::PathParameters;
use super::Success;

/// Comment response going to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    /// Comment ID
    pub id: Uuid,

    /// The note commented on
    pub note_id: Uuid,

    /// The block commented on
    pub block_id: Option<Uuid>,

    /// Author
    pub author_id: Uuid,

    /// The comment itself
    pub content: String,

    /// Is the comment resolved?
    pub resolved: bool,

    /// Resolved by
    pub resolved_by: Option<Uuid>,

    /// Resolved at
    pub resolved_at: Option<NaiveDateTime>,

    /// Creation date
    pub created_at: NaiveDateTime,
}

impl CommentResponse {
    /// Create a response from a [`Comment`](Comment)
    fn from_comment(comment: Comment) -> Self {
        Self {
            resolved: comment.is_resolved(),
            resolved_by: comment
                .resolution
                .as_ref()
                .map(|resolution| resolution.resolved_by),
            resolved_at: comment
                .resolution
                .as_ref()
                .map(|resolution| resolution.resolved_at),
            id: comment.id,
            note_id: comment.note_id,
            block_id: comment.block_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

/// List all comments on a note, newest first
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/comments
/// ```
pub async fn list<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
) -> Result<Success<Vec<CommentResponse>>, Error> {
    let comments = service
        .list_comments(&current_actor, &workspace_id, &note_id)
        .await?;

    Ok(Success::ok(
        comments
            .into_iter()
            .map(CommentResponse::from_comment)
            .collect(),
    ))
}

/// Create comment form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentForm {
    /// The comment itself
    content: String,

    /// Block of the note to comment on
    block_id: Option<Uuid>,
}

/// Comment on a note based on the [`CreateCommentForm`](CreateCommentForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "content": "Oat milk?", "blockId": "<uuid>" }' \
///     http://localhost:6000/api/workspaces/<uuid>/notes/<uuid>/comments
/// ```
pub async fn create<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id)): PathParameters<(Uuid, Uuid)>,
    Form(form): Form<CreateCommentForm>,
) -> Result<Success<CommentResponse>, Error> {
    let values = CreateComment {
        content: form.content,
        block_id: form.block_id,
    };

    let comment = service
        .create_comment(&current_actor, &workspace_id, &note_id, values)
        .await?;

    activity_log
        .register(ActivityEntry::CreateComment(&comment))
        .await;

    Ok(Success::created(CommentResponse::from_comment(comment)))
}

/// Resolve a comment
pub async fn resolve<S: Storage>(
    activity_log: ActivityLog<S>,
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, comment_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<CommentResponse>, Error> {
    let comment = service
        .resolve_comment(&current_actor, &workspace_id, &note_id, &comment_id)
        .await?;

    activity_log
        .register(ActivityEntry::ResolveComment(&comment))
        .await;

    Ok(Success::ok(CommentResponse::from_comment(comment)))
}

/// Open a resolved comment again
pub async fn unresolve<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, comment_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<CommentResponse>, Error> {
    let comment = service
        .reopen_comment(&current_actor, &workspace_id, &note_id, &comment_id)
        .await?;

    Ok(Success::ok(CommentResponse::from_comment(comment)))
}

/// Delete a comment, only its author can
pub async fn delete<S: Storage>(
    Extension(service): Extension<NoteService<S>>,
    current_actor: CurrentActor,
    PathParameters((workspace_id, note_id, comment_id)): PathParameters<(Uuid, Uuid, Uuid)>,
) -> Result<Success<&'static str>, Error> {
    service
        .delete_comment(&current_actor, &workspace_id, &note_id, &comment_id)
        .await?;

    Ok(Success::<&'static str>::no_content())
}

use axum::Router;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tower::Service;
use uuid::Uuid;

use crate::actors::Actor;
use crate::api::JwtKeys;
use crate::api::generate_token;
use crate::config::AppConfig;
use crate::setup_app;
use crate::storage;

const JWT_SECRET: &str = "verysecret";

/// Test helper version of Block struct
#[derive(Debug, PartialEq, Eq)]
pub struct Block {
    pub id: Uuid,
    pub block_type: String,
    pub content: String,
    pub checked: bool,
}

/// Test helper version of Note struct
#[derive(Debug, PartialEq, Eq)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub version: i64,
    pub blocks: Vec<Block>,
    pub last_edited_by: Uuid,
}

impl Note {
    pub fn contents(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .map(|block| block.content.as_str())
            .collect()
    }
}

/// Test helper version of Revision struct
#[derive(Debug, PartialEq, Eq)]
pub struct Revision {
    pub id: Uuid,
    pub version: i64,
    pub blocks: Vec<Block>,
    pub created_by: Uuid,
}

/// Test helper version of Activity struct
#[derive(Debug, PartialEq, Eq)]
pub struct Activity {
    pub action: String,
    pub note_id: Uuid,
    pub actor_id: Uuid,
    pub metadata: Value,
}

/// Test helper version of Comment struct
#[derive(Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub block_id: Option<Uuid>,
    pub author_id: Uuid,
    pub content: String,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
}

/// A note read through its share link
#[derive(Debug, PartialEq, Eq)]
pub struct SharedNote {
    pub id: Uuid,
    pub title: String,
    pub blocks: Vec<Block>,
    pub has_workspace: bool,
}

/// Test helper version of ShareLink struct
#[derive(Debug, PartialEq, Eq)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
    pub expires_at: Option<String>,
}

/// Error response
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    pub error: String,
    pub description: Option<String>,
    pub conflict: Option<Value>,
}

/// Setup the Scribe app with memory storage
pub async fn setup_test_app() -> Router {
    setup_app(AppConfig {
        storage: storage::Config::Memory,
        jwt_secret: JWT_SECRET.to_string(),
    })
    .await
    .unwrap()
}

/// An actor that is a member of the given workspaces
pub fn actor(name: &str, workspaces: &[Uuid]) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: name.to_string(),
        workspaces: workspaces.to_vec(),
    }
}

/// Authorization header value for an actor
pub fn access_token(actor: &Actor) -> String {
    let token = generate_token(&JwtKeys::new(JWT_SECRET.as_bytes()), actor).unwrap();

    format!("Bearer {}", token.access_token)
}

pub fn notes_uri(workspace_id: &Uuid) -> String {
    format!("/api/workspaces/{workspace_id}/notes")
}

pub fn note_uri(workspace_id: &Uuid, note_id: &Uuid) -> String {
    format!("/api/workspaces/{workspace_id}/notes/{note_id}")
}

/// Draft payload of a paragraph block
pub fn paragraph(id: Option<&Uuid>, content: &str) -> Value {
    match id {
        Some(id) => json!({ "id": id, "content": content }),
        None => json!({ "content": content }),
    }
}

pub async fn send(
    app: &mut Router,
    method: Method,
    uri: &str,
    access_token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    let body = match payload {
        Some(payload) => {
            builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
            Body::from(serde_json::to_vec(&payload).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.call(builder.body(body).unwrap()).await.unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, body)
}

pub async fn send_raw(
    app: &mut Router,
    uri: &str,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> (StatusCode, Error) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(AUTHORIZATION, access_token);

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let response = app
        .call(builder.body(Body::from(body.as_bytes())).unwrap())
        .await
        .unwrap();
    let status_code = response.status();

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, get_error(&body))
}

pub async fn maybe_create_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    payload: Value,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &notes_uri(workspace_id),
        Some(access_token),
        Some(payload),
    )
    .await;

    note_or_error(status_code, StatusCode::CREATED, &body)
}

pub async fn create_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    title: &str,
    contents: &[&str],
) -> Note {
    let blocks = contents
        .iter()
        .map(|content| paragraph(None, content))
        .collect::<Vec<_>>();

    let (status_code, note, _) = maybe_create_note(
        app,
        access_token,
        workspace_id,
        json!({ "title": title, "blocks": blocks }),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);

    note.unwrap()
}

pub async fn maybe_update_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    payload: Value,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::PATCH,
        &note_uri(workspace_id, note_id),
        Some(access_token),
        Some(payload),
    )
    .await;

    note_or_error(status_code, StatusCode::OK, &body)
}

/// Replace the blocks of a note, keeping the ID of the first block
pub async fn update_contents(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note: &Note,
    version: i64,
    contents: &[&str],
) -> (StatusCode, Option<Note>, Option<Error>) {
    let blocks = contents
        .iter()
        .enumerate()
        .map(|(index, content)| {
            paragraph(
                note.blocks.get(index).map(|block| &block.id),
                content,
            )
        })
        .collect::<Vec<_>>();

    maybe_update_note(
        app,
        access_token,
        workspace_id,
        &note.id,
        json!({ "version": version, "blocks": blocks }),
    )
    .await
}

pub async fn single_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &note_uri(workspace_id, note_id),
        Some(access_token),
        None,
    )
    .await;

    note_or_error(status_code, StatusCode::OK, &body)
}

pub async fn list_notes(
    app: &mut Router,
    access_token: &str,
    uri: &str,
) -> (StatusCode, Option<Vec<Note>>) {
    let (status_code, body) = send(app, Method::GET, uri, Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_data_list(&body, value_to_note))
        } else {
            None
        },
    )
}

pub async fn maybe_delete_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
) -> StatusCode {
    let (status_code, _) = send(
        app,
        Method::DELETE,
        &note_uri(workspace_id, note_id),
        Some(access_token),
        None,
    )
    .await;

    status_code
}

pub async fn list_revisions(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
) -> (StatusCode, Option<Vec<Revision>>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("{}/revisions", note_uri(workspace_id, note_id)),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_data_list(&body, value_to_revision))
        } else {
            None
        },
    )
}

pub async fn single_revision(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    revision_id: &Uuid,
) -> (StatusCode, Option<Revision>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &format!("{}/revisions/{revision_id}", note_uri(workspace_id, note_id)),
        Some(access_token),
        None,
    )
    .await;

    if status_code == StatusCode::OK {
        (status_code, Some(get_data(&body, value_to_revision)), None)
    } else {
        (status_code, None, Some(get_error(&body)))
    }
}

pub async fn maybe_restore_revision(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    revision_id: &Uuid,
) -> (StatusCode, Option<Note>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &format!(
            "{}/revisions/{revision_id}/restore",
            note_uri(workspace_id, note_id)
        ),
        Some(access_token),
        None,
    )
    .await;

    note_or_error(status_code, StatusCode::OK, &body)
}

pub async fn list_activity(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    query: &str,
) -> (StatusCode, Option<Vec<Activity>>) {
    activity_at(
        app,
        access_token,
        &format!("/api/workspaces/{workspace_id}/activity{query}"),
    )
    .await
}

pub async fn list_note_activity(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    query: &str,
) -> (StatusCode, Option<Vec<Activity>>) {
    activity_at(
        app,
        access_token,
        &format!("{}/activity{query}", note_uri(workspace_id, note_id)),
    )
    .await
}

async fn activity_at(
    app: &mut Router,
    access_token: &str,
    uri: &str,
) -> (StatusCode, Option<Vec<Activity>>) {
    let (status_code, body) = send(app, Method::GET, uri, Some(access_token), None).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_data_list(&body, value_to_activity))
        } else {
            None
        },
    )
}

pub fn comments_uri(workspace_id: &Uuid, note_id: &Uuid) -> String {
    format!("{}/comments", note_uri(workspace_id, note_id))
}

pub async fn maybe_create_comment(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    payload: Value,
) -> (StatusCode, Option<Comment>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &comments_uri(workspace_id, note_id),
        Some(access_token),
        Some(payload),
    )
    .await;

    comment_or_error(status_code, StatusCode::CREATED, &body)
}

pub async fn list_comments(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
) -> (StatusCode, Option<Vec<Comment>>) {
    let (status_code, body) = send(
        app,
        Method::GET,
        &comments_uri(workspace_id, note_id),
        Some(access_token),
        None,
    )
    .await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_data_list(&body, value_to_comment))
        } else {
            None
        },
    )
}

/// Resolve or unresolve a comment
pub async fn maybe_change_comment(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    comment_id: &Uuid,
    action: &str,
) -> (StatusCode, Option<Comment>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &format!("{}/{comment_id}/{action}", comments_uri(workspace_id, note_id)),
        Some(access_token),
        None,
    )
    .await;

    comment_or_error(status_code, StatusCode::OK, &body)
}

pub async fn maybe_delete_comment(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    comment_id: &Uuid,
) -> (StatusCode, Bytes) {
    send(
        app,
        Method::DELETE,
        &format!("{}/{comment_id}", comments_uri(workspace_id, note_id)),
        Some(access_token),
        None,
    )
    .await
}

pub fn share_uri(workspace_id: &Uuid, note_id: &Uuid) -> String {
    format!("{}/share", note_uri(workspace_id, note_id))
}

pub async fn maybe_share_note(
    app: &mut Router,
    access_token: &str,
    workspace_id: &Uuid,
    note_id: &Uuid,
    payload: Value,
) -> (StatusCode, Option<ShareLink>, Option<Error>) {
    let (status_code, body) = send(
        app,
        Method::POST,
        &share_uri(workspace_id, note_id),
        Some(access_token),
        Some(payload),
    )
    .await;

    if status_code == StatusCode::CREATED {
        (status_code, Some(get_data(&body, value_to_share_link)), None)
    } else {
        (status_code, None, Some(get_error(&body)))
    }
}

pub async fn maybe_shared_note(
    app: &mut Router,
    uri: &str,
) -> (StatusCode, Option<SharedNote>, Option<Error>) {
    let (status_code, body) = send(app, Method::GET, uri, None, None).await;

    if status_code == StatusCode::OK {
        (status_code, Some(get_data(&body, value_to_shared_note)), None)
    } else {
        (status_code, None, Some(get_error(&body)))
    }
}

fn note_or_error(
    status_code: StatusCode,
    success: StatusCode,
    body: &Bytes,
) -> (StatusCode, Option<Note>, Option<Error>) {
    if status_code == success {
        (status_code, Some(get_data(body, value_to_note)), None)
    } else {
        (status_code, None, Some(get_error(body)))
    }
}

fn comment_or_error(
    status_code: StatusCode,
    success: StatusCode,
    body: &Bytes,
) -> (StatusCode, Option<Comment>, Option<Error>) {
    if status_code == success {
        (status_code, Some(get_data(body, value_to_comment)), None)
    } else {
        (status_code, None, Some(get_error(body)))
    }
}

fn uuid(value: &Value) -> Uuid {
    value.as_str().map(Uuid::parse_str).unwrap().unwrap()
}

fn value_to_block(block: &Map<String, Value>) -> Block {
    Block {
        id: uuid(&block["id"]),
        block_type: block["type"].as_str().map(ToString::to_string).unwrap(),
        content: block["content"].as_str().map(ToString::to_string).unwrap(),
        checked: block["checked"].as_bool().unwrap(),
    }
}

fn value_to_blocks(blocks: &Value) -> Vec<Block> {
    blocks
        .as_array()
        .unwrap()
        .iter()
        .map(|block| block.as_object().unwrap())
        .map(value_to_block)
        .collect()
}

fn value_to_note(note: &Map<String, Value>) -> Note {
    Note {
        id: uuid(&note["id"]),
        title: note["title"].as_str().map(ToString::to_string).unwrap(),
        version: note["version"].as_i64().unwrap(),
        blocks: value_to_blocks(&note["blocks"]),
        last_edited_by: uuid(&note["lastEditedBy"]),
    }
}

fn value_to_revision(revision: &Map<String, Value>) -> Revision {
    Revision {
        id: uuid(&revision["id"]),
        version: revision["version"].as_i64().unwrap(),
        blocks: value_to_blocks(&revision["blocks"]),
        created_by: uuid(&revision["createdBy"]),
    }
}

fn value_to_activity(activity: &Map<String, Value>) -> Activity {
    Activity {
        action: activity["action"].as_str().map(ToString::to_string).unwrap(),
        note_id: uuid(&activity["noteId"]),
        actor_id: uuid(&activity["actorId"]),
        metadata: activity["metadata"].clone(),
    }
}

fn value_to_shared_note(note: &Map<String, Value>) -> SharedNote {
    SharedNote {
        id: uuid(&note["id"]),
        title: note["title"].as_str().map(ToString::to_string).unwrap(),
        blocks: value_to_blocks(&note["blocks"]),
        has_workspace: note.contains_key("workspaceId"),
    }
}

fn value_to_comment(comment: &Map<String, Value>) -> Comment {
    Comment {
        id: uuid(&comment["id"]),
        block_id: comment["blockId"].as_str().map(|id| Uuid::parse_str(id).unwrap()),
        author_id: uuid(&comment["authorId"]),
        content: comment["content"].as_str().map(ToString::to_string).unwrap(),
        resolved: comment["resolved"].as_bool().unwrap(),
        resolved_by: comment["resolvedBy"]
            .as_str()
            .map(|id| Uuid::parse_str(id).unwrap()),
    }
}

fn value_to_share_link(share_link: &Map<String, Value>) -> ShareLink {
    ShareLink {
        token: share_link["token"].as_str().map(ToString::to_string).unwrap(),
        url: share_link["url"].as_str().map(ToString::to_string).unwrap(),
        expires_at: share_link["expiresAt"].as_str().map(ToString::to_string),
    }
}

fn value_to_error(error: &Map<String, Value>) -> Error {
    Error {
        error: error["error"].as_str().map(ToString::to_string).unwrap(),
        description: error
            .get("description")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        conflict: error.get("conflict").cloned(),
    }
}

pub fn get_data<T>(body: &Bytes, convert: fn(&Map<String, Value>) -> T) -> T {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(convert)
        .unwrap()
}

pub fn get_data_list<T>(body: &Bytes, convert: fn(&Map<String, Value>) -> T) -> Vec<T> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|value| value.as_object().unwrap())
        .map(convert)
        .collect()
}

pub fn get_error(body: &Bytes) -> Error {
    serde_json::from_slice::<Value>(&body[..])
        .unwrap()
        .as_object()
        .map(value_to_error)
        .unwrap()
}

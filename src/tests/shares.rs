use axum::http::Method;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_share_note() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note =
        helper::create_note(&mut app, &access_token, &workspace_id, "Recipe", &["Flour"]).await;

    let (status_code, share_link, _) =
        helper::maybe_share_note(&mut app, &access_token, &workspace_id, &note.id, json!({}))
            .await;
    assert_eq!(StatusCode::CREATED, status_code);
    let share_link = share_link.unwrap();

    assert_eq!(64, share_link.token.len());
    assert_eq!(format!("/api/share/{}", share_link.token), share_link.url);
    assert_eq!(None, share_link.expires_at);

    // no token needed to read it
    let (status_code, shared, _) = helper::maybe_shared_note(&mut app, &share_link.url).await;
    assert_eq!(StatusCode::OK, status_code);
    let shared = shared.unwrap();

    assert_eq!(note.id, shared.id);
    assert_eq!("Recipe", shared.title);
    assert_eq!(note.blocks, shared.blocks);
    assert!(!shared.has_workspace);

    // later changes are visible through the link
    helper::update_contents(&mut app, &access_token, &workspace_id, &note, 1, &["Sugar"]).await;

    let (_, shared, _) = helper::maybe_shared_note(&mut app, &share_link.url).await;
    assert_eq!("Sugar", shared.unwrap().blocks[0].content);

    // the link of a note
    let (status_code, body) = helper::send(
        &mut app,
        Method::GET,
        &helper::share_uri(&workspace_id, &note.id),
        Some(&access_token),
        None,
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);
    let body = serde_json::from_slice::<serde_json::Value>(&body).unwrap();
    assert_eq!(json!(share_link.token), body["data"]["token"]);
}

#[tokio::test]
async fn test_share_again_replaces_token() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "Plan", &["a"]).await;

    let (_, first, _) =
        helper::maybe_share_note(&mut app, &access_token, &workspace_id, &note.id, json!({}))
            .await;
    let (_, second, _) =
        helper::maybe_share_note(&mut app, &access_token, &workspace_id, &note.id, json!({}))
            .await;
    let first = first.unwrap();
    let second = second.unwrap();

    assert_ne!(first.token, second.token);

    let (status_code, _, error) = helper::maybe_shared_note(&mut app, &first.url).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Shared note not found", error.unwrap().error);

    let (status_code, _, _) = helper::maybe_shared_note(&mut app, &second.url).await;
    assert_eq!(StatusCode::OK, status_code);
}

#[tokio::test]
async fn test_unshare_note() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "Plan", &["a"]).await;

    let (_, share_link, _) =
        helper::maybe_share_note(&mut app, &access_token, &workspace_id, &note.id, json!({}))
            .await;
    let share_link = share_link.unwrap();

    let (status_code, _) = helper::send(
        &mut app,
        Method::DELETE,
        &helper::share_uri(&workspace_id, &note.id),
        Some(&access_token),
        None,
    )
    .await;
    assert_eq!(StatusCode::NO_CONTENT, status_code);

    let (status_code, _, _) = helper::maybe_shared_note(&mut app, &share_link.url).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);

    let (status_code, body) = helper::send(
        &mut app,
        Method::DELETE,
        &helper::share_uri(&workspace_id, &note.id),
        Some(&access_token),
        None,
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Note is not shared", helper::get_error(&body).error);
}

#[tokio::test]
async fn test_share_expiry() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "Plan", &["a"]).await;

    let (status_code, _, error) = helper::maybe_share_note(
        &mut app,
        &access_token,
        &workspace_id,
        &note.id,
        json!({ "expiresAt": "2000-01-01T00:00:00" }),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Expiry date must be in the future", error.unwrap().error);

    let (status_code, share_link, _) = helper::maybe_share_note(
        &mut app,
        &access_token,
        &workspace_id,
        &note.id,
        json!({ "expiresAt": "2999-01-01T00:00:00" }),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status_code);
    let share_link = share_link.unwrap();
    assert_eq!(Some("2999-01-01T00:00:00".to_string()), share_link.expires_at);

    let (status_code, _, _) = helper::maybe_shared_note(&mut app, &share_link.url).await;
    assert_eq!(StatusCode::OK, status_code);
}

#[tokio::test]
async fn test_shared_note_is_gone_with_the_note() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "Plan", &["a"]).await;

    let (_, share_link, _) =
        helper::maybe_share_note(&mut app, &access_token, &workspace_id, &note.id, json!({}))
            .await;

    helper::maybe_delete_note(&mut app, &access_token, &workspace_id, &note.id).await;

    let (status_code, _, error) =
        helper::maybe_shared_note(&mut app, &share_link.unwrap().url).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Shared note not found", error.unwrap().error);

    let (status_code, _, _) = helper::maybe_shared_note(&mut app, "/api/share/unknown").await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}

#[tokio::test]
async fn test_share_needs_access() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));
    let outsider_token = helper::access_token(&helper::actor("mallory", &[Uuid::new_v4()]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "Plan", &["a"]).await;

    let (status_code, _, _) =
        helper::maybe_share_note(&mut app, &outsider_token, &workspace_id, &note.id, json!({}))
            .await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
}

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_revisions_and_restore() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let alice = helper::actor("alice", &[workspace_id]);
    let bob = helper::actor("bob", &[workspace_id]);
    let alice_token = helper::access_token(&alice);
    let bob_token = helper::access_token(&bob);

    let note = helper::create_note(&mut app, &alice_token, &workspace_id, "Plan", &["one"]).await;

    // creating a note records nothing
    let (status_code, revisions) =
        helper::list_revisions(&mut app, &alice_token, &workspace_id, &note.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(Vec::new()), revisions);

    helper::update_contents(&mut app, &alice_token, &workspace_id, &note, 1, &["two"]).await;
    helper::update_contents(&mut app, &alice_token, &workspace_id, &note, 2, &["three"]).await;

    // newest first
    let (_, revisions) =
        helper::list_revisions(&mut app, &alice_token, &workspace_id, &note.id).await;
    let revisions = revisions.unwrap();
    assert_eq!(
        vec![3, 2],
        revisions
            .iter()
            .map(|revision| revision.version)
            .collect::<Vec<_>>()
    );
    assert_eq!("three", revisions[0].blocks[0].content);
    assert_eq!("two", revisions[1].blocks[0].content);

    let two = &revisions[1];

    let (status_code, single, _) =
        helper::single_revision(&mut app, &bob_token, &workspace_id, &note.id, &two.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(Some(two), single.as_ref());

    // bob restores version 2
    let (status_code, restored, _) =
        helper::maybe_restore_revision(&mut app, &bob_token, &workspace_id, &note.id, &two.id)
            .await;
    assert_eq!(StatusCode::OK, status_code);
    let restored = restored.unwrap();
    assert_eq!(4, restored.version);
    assert_eq!(vec!["two"], restored.contents());
    assert_eq!(bob.id, restored.last_edited_by);

    // the overwritten blocks are kept as a revision by the restorer
    let (_, revisions) =
        helper::list_revisions(&mut app, &alice_token, &workspace_id, &note.id).await;
    let revisions = revisions.unwrap();
    assert_eq!(3, revisions.len());
    assert_eq!(3, revisions[0].version);
    assert_eq!("three", revisions[0].blocks[0].content);
    assert_eq!(bob.id, revisions[0].created_by);

    // restoring is version guarded too, the next edit goes on top of 4
    let (status_code, _, _) =
        helper::update_contents(&mut app, &alice_token, &workspace_id, &note, 3, &["late"]).await;
    assert_eq!(StatusCode::CONFLICT, status_code);
}

#[tokio::test]
async fn test_restore_checks_revision_and_note() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));

    let note = helper::create_note(&mut app, &access_token, &workspace_id, "One", &["a"]).await;
    let other = helper::create_note(&mut app, &access_token, &workspace_id, "Two", &["b"]).await;

    helper::update_contents(&mut app, &access_token, &workspace_id, &other, 1, &["bb"]).await;
    let (_, revisions) =
        helper::list_revisions(&mut app, &access_token, &workspace_id, &other.id).await;
    let revisions = revisions.unwrap();
    let revision = &revisions[0];

    // a revision of another note
    let (status_code, _, error) = helper::maybe_restore_revision(
        &mut app,
        &access_token,
        &workspace_id,
        &note.id,
        &revision.id,
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Revision not found", error.unwrap().error);

    // an unknown revision
    let (status_code, _, error) = helper::single_revision(
        &mut app,
        &access_token,
        &workspace_id,
        &note.id,
        &Uuid::new_v4(),
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Revision not found", error.unwrap().error);

    // an unknown note
    let (status_code, _, error) = helper::maybe_restore_revision(
        &mut app,
        &access_token,
        &workspace_id,
        &Uuid::new_v4(),
        &revision.id,
    )
    .await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!("Note not found", error.unwrap().error);

    // nothing changed
    let (_, note_after, _) =
        helper::single_note(&mut app, &access_token, &workspace_id, &note.id).await;
    assert_eq!(Some(&note), note_after.as_ref());
}

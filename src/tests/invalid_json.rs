use axum::http::StatusCode;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_invalid_json() {
    let mut app = helper::setup_test_app().await;

    let workspace_id = Uuid::new_v4();
    let access_token = helper::access_token(&helper::actor("alice", &[workspace_id]));
    let uri = helper::notes_uri(&workspace_id);

    // wrong data
    let body = r#"{"blocks":"nope"}"#;
    let (status_code, error) = helper::send_raw(&mut app, &uri, &access_token, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Data error".to_string(), error.error);
    assert!(error.description.is_some());

    // syntax error
    let body = r#"{"}"#;
    let (status_code, error) = helper::send_raw(&mut app, &uri, &access_token, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("JSON syntax error".to_string(), error.error);
    assert_eq!(
        Some("EOF while parsing a string at line 1 column 3".to_string()),
        error.description
    );

    // syntax error
    let body = r#"{"foo":{"bar":}}"#;
    let (status_code, error) = helper::send_raw(&mut app, &uri, &access_token, body, true).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("JSON syntax error".to_string(), error.error);
    assert_eq!(
        Some("foo: expected value at line 1 column 15".to_string()),
        error.description
    );

    // missing content type
    let body = r"{}";
    let (status_code, error) = helper::send_raw(&mut app, &uri, &access_token, body, false).await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(
        "Missing `application/json` content type".to_string(),
        error.error
    );

    // nothing was created
    let (_, notes) = helper::list_notes(&mut app, &access_token, &uri).await;
    assert_eq!(Some(0), notes.map(|notes| notes.len()));
}

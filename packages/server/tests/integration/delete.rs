use crate::common::{TestApp, routes};

#[tokio::test]
async fn delete_removes_record_and_image() {
    let app = TestApp::spawn().await;
    app.seed_asset("photo.png", b"png");
    for _ in 0..4 {
        app.create_usuario("Filler", None).await;
    }
    let id = app.create_usuario("Rust", Some("photo.png")).await;
    assert_eq!(id, 5);

    let res = app.delete(&routes::usuario(5)).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body, serde_json::json!({ "message": "Deletado" }));
    assert!(app.asset_files().is_empty());
    assert_eq!(app.get(&routes::usuario(5)).await.status, 204);
}

#[tokio::test]
async fn delete_without_image_succeeds() {
    let app = TestApp::spawn().await;
    app.seed_asset("other.png", b"png");
    let id = app.create_usuario("Rust", None).await;

    let res = app.delete(&routes::usuario(id)).await;

    assert_eq!(res.status, 200);
    assert_eq!(app.asset_files(), vec!["other.png"]);
}

#[tokio::test]
async fn delete_with_dangling_image_reference_succeeds() {
    let app = TestApp::spawn().await;
    let id = app.create_usuario("Rust", Some("gone.png")).await;

    let res = app.delete(&routes::usuario(id)).await;

    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn delete_missing_usuario_is_no_content() {
    let app = TestApp::spawn().await;

    let res = app.delete(&routes::usuario(77)).await;

    assert_eq!(res.status, 204);
}

#[tokio::test]
async fn store_refusing_delete_keeps_image() {
    let app = TestApp::spawn().await;
    app.seed_asset("photo.png", b"png");
    let id = app.create_usuario("Rust", Some("photo.png")).await;
    app.store.reject_deletes();

    let res = app.delete(&routes::usuario(id)).await;

    assert_eq!(res.status, 500);
    let message = res.body["message"].as_str().unwrap();
    assert!(message.starts_with("Failed to delete usuario. Error: "), "{message}");
    assert_eq!(app.asset_files(), vec!["photo.png"]);
    assert_eq!(app.get(&routes::usuario(id)).await.status, 200);
}

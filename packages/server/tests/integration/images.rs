use std::time::Duration;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn uploaded_image_can_be_downloaded() {
    let app = TestApp::spawn().await;
    let id = app.create_usuario("Rust", None).await;
    let uploaded = app
        .upload(&routes::upload_image(id), "banner.png", b"PNG_DATA".to_vec())
        .await;

    let res = app.download(&routes::image(uploaded.image_url())).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"PNG_DATA");
}

#[tokio::test]
async fn missing_image_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::image("nothing.png")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn hidden_names_are_not_served() {
    let app = TestApp::spawn().await;
    app.seed_asset(".secret", b"x");

    let res = app.get(&routes::image(".secret")).await;

    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn sweep_removes_unreferenced_images_only() {
    let app = TestApp::spawn().await;
    app.seed_asset("photo.png", b"png");
    app.seed_asset("orphan.png", b"png");
    app.create_usuario("Rust", Some("photo.png")).await;

    let report = app.service.sweep_orphans(Duration::ZERO).await.unwrap();

    assert_eq!(report.removed.len(), 1);
    assert_eq!(report.removed[0].as_str(), "orphan.png");
    assert_eq!(app.asset_files(), vec!["photo.png"]);
}

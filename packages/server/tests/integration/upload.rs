use common::ReplaceStrategy;

use crate::common::{TestApp, is_generated_name, routes};

mod replace {
    use super::*;

    #[tokio::test]
    async fn upload_replaces_existing_image() {
        let app = TestApp::spawn().await;
        app.seed_asset("photo.png", b"old");
        for _ in 0..4 {
            app.create_usuario("Filler", None).await;
        }
        let id = app.create_usuario("Rust", Some("photo.png")).await;
        assert_eq!(id, 5);

        let res = app
            .upload(&routes::upload_image(5), "new.jpg", vec![7u8; 100])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let name = res.image_url().to_string();
        assert!(is_generated_name(&name, "new", ".jpg"), "{name}");
        assert_eq!(app.asset_files(), vec![name.clone()]);
        let stored = std::fs::read(app.asset_dir().join(&name)).unwrap();
        assert_eq!(stored, vec![7u8; 100]);

        let fetched = app.get(&routes::usuario(5)).await;
        assert_eq!(fetched.image_url(), name);
        assert_eq!(fetched.body["redesSociais"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_without_previous_image_only_adds_a_file() {
        let app = TestApp::spawn().await;
        app.seed_asset("unrelated.png", b"keep me");
        let id = app.create_usuario("Rust", None).await;

        let res = app
            .upload(&routes::upload_image(id), "my holiday photo.jpeg", vec![1u8; 10])
            .await;

        assert_eq!(res.status, 200);
        let name = res.image_url().to_string();
        assert!(is_generated_name(&name, "my-holiday", ".jpeg"), "{name}");
        assert_eq!(app.asset_files(), {
            let mut expected = vec![name, "unrelated.png".to_string()];
            expected.sort();
            expected
        });
    }

    #[tokio::test]
    async fn both_strategies_leave_one_file() {
        for strategy in [ReplaceStrategy::DeleteThenStore, ReplaceStrategy::StoreThenSwap] {
            let app = TestApp::spawn_with(strategy).await;
            app.seed_asset("photo.png", b"old");
            let id = app.create_usuario("Rust", Some("photo.png")).await;

            let first = app.upload(&routes::upload_image(id), "a.png", vec![1; 8]).await;
            let second = app.upload(&routes::upload_image(id), "b.png", vec![2; 8]).await;

            assert_eq!(first.status, 200);
            assert_eq!(second.status, 200);
            assert_eq!(app.asset_files(), vec![second.image_url().to_string()]);
        }
    }

    #[tokio::test]
    async fn concurrent_uploads_leave_exactly_the_referenced_file() {
        let app = TestApp::spawn().await;
        app.seed_asset("photo.png", b"old");
        let id = app.create_usuario("Rust", Some("photo.png")).await;

        let uploads = (0..6).map(|i| {
            let path = routes::upload_image(id);
            let app = &app;
            async move { app.upload(&path, &format!("img{i}.png"), vec![i as u8; 32]).await }
        });
        let results = futures::future::join_all(uploads).await;
        assert!(results.iter().all(|r| r.status == 200));

        let current = app.get(&routes::usuario(id)).await;
        assert_eq!(app.asset_files(), vec![current.image_url().to_string()]);
    }
}

mod edge_cases {
    use super::*;

    #[tokio::test]
    async fn empty_file_keeps_image_and_returns_usuario() {
        let app = TestApp::spawn().await;
        app.seed_asset("photo.png", b"old");
        let id = app.create_usuario("Rust", Some("photo.png")).await;

        let res = app.upload(&routes::upload_image(id), "new.jpg", Vec::new()).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.image_url(), "photo.png");
        assert_eq!(app.asset_files(), vec!["photo.png"]);
    }

    #[tokio::test]
    async fn missing_usuario_is_no_content_and_stores_nothing() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::upload_image(999), "new.jpg", vec![1; 100])
            .await;

        assert_eq!(res.status, 204);
        assert!(app.asset_files().is_empty());
    }

    #[tokio::test]
    async fn request_without_file_is_internal_error() {
        let app = TestApp::spawn().await;
        let id = app.create_usuario("Rust", None).await;

        let form = reqwest::multipart::Form::new().text("note", "no file here");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::upload_image(id)))
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        let body: serde_json::Value = res.json().await.unwrap();

        assert_eq!(status, 500);
        assert_eq!(
            body["message"],
            "Failed to upload usuario image. Error: No file was uploaded"
        );
    }

    #[tokio::test]
    async fn non_multipart_body_is_internal_error() {
        let app = TestApp::spawn().await;
        let id = app.create_usuario("Rust", None).await;

        let res = app
            .post_raw(&routes::upload_image(id), "text/plain", "hello")
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn oversized_file_keeps_previous_image() {
        let app = TestApp::spawn().await;
        app.seed_asset("photo.png", b"old");
        let id = app.create_usuario("Rust", Some("photo.png")).await;

        let res = app
            .upload(&routes::upload_image(id), "big.png", vec![0; 1024 * 1024 + 1])
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(app.asset_files(), vec!["photo.png"]);
        assert_eq!(app.get(&routes::usuario(id)).await.image_url(), "photo.png");
    }

    #[tokio::test]
    async fn failed_persistence_keeps_previous_image() {
        let app = TestApp::spawn().await;
        app.seed_asset("photo.png", b"old");
        let id = app.create_usuario("Rust", Some("photo.png")).await;
        app.store.fail_updates();

        let res = app.upload(&routes::upload_image(id), "new.jpg", vec![1; 10]).await;

        assert_eq!(res.status, 500);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to upload usuario image. Error: ")
        );
        assert_eq!(app.asset_files(), vec!["photo.png"]);
    }
}

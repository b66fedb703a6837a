use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::storage::filesystem::FilesystemAssetStore;
use common::{AssetStorageConfig, ReplaceStrategy};
use reqwest::Client;
use sea_orm::DbErr;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig};
use server::models::usuario::{UsuarioDetail, UsuarioPayload};
use server::service::UsuarioService;
use server::state::AppState;
use server::store::{MemoryUsuarioStore, StoreResult, UsuarioStore};

pub mod routes {
    pub const USUARIOS: &str = "/api/usuarios";

    pub fn usuario(id: i32) -> String {
        format!("/api/usuarios/{id}")
    }

    pub fn by_theme(theme: &str) -> String {
        format!("/api/usuarios/{theme}/tema")
    }

    pub fn upload_image(id: i32) -> String {
        format!("/api/usuarios/upload-image/{id}")
    }

    pub fn image(name: &str) -> String {
        format!("/resources/images/{name}")
    }
}

/// In-memory store whose deletes and updates can be made to fail.
#[derive(Default)]
pub struct TestStore {
    inner: MemoryUsuarioStore,
    reject_deletes: AtomicBool,
    fail_updates: AtomicBool,
}

impl TestStore {
    /// Make `delete` report that nothing was deleted.
    pub fn reject_deletes(&self) {
        self.reject_deletes.store(true, Ordering::SeqCst);
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UsuarioStore for TestStore {
    async fn get_all(&self, include_related: bool) -> StoreResult<Vec<UsuarioDetail>> {
        self.inner.get_all(include_related).await
    }

    async fn get_by_id(&self, id: i32, include_related: bool) -> StoreResult<Option<UsuarioDetail>> {
        self.inner.get_by_id(id, include_related).await
    }

    async fn get_all_by_theme(
        &self,
        theme: &str,
        include_related: bool,
    ) -> StoreResult<Vec<UsuarioDetail>> {
        self.inner.get_all_by_theme(theme, include_related).await
    }

    async fn add(&self, payload: UsuarioPayload) -> StoreResult<Option<UsuarioDetail>> {
        self.inner.add(payload).await
    }

    async fn update(&self, id: i32, payload: UsuarioPayload) -> StoreResult<Option<UsuarioDetail>> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("connection reset".into()));
        }
        self.inner.update(id, payload).await
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        if self.reject_deletes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.delete(id).await
    }

    async fn referenced_images(&self) -> StoreResult<HashSet<String>> {
        self.inner.referenced_images().await
    }
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<TestStore>,
    pub service: Arc<UsuarioService>,
    asset_dir: PathBuf,
    _content_root: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(ReplaceStrategy::default()).await
    }

    pub async fn spawn_with(replace_strategy: ReplaceStrategy) -> Self {
        let content_root = tempfile::tempdir().expect("Failed to create temp dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "memory".to_string(),
            },
            storage: AssetStorageConfig {
                content_root: content_root.path().to_path_buf(),
                max_asset_size: 1024 * 1024,
                replace_strategy,
                sweep_on_startup: false,
                ..Default::default()
            },
        };

        let assets = FilesystemAssetStore::from_config(&app_config.storage)
            .await
            .expect("Failed to create asset store");
        let asset_dir = assets.base_path().to_path_buf();

        let store = Arc::new(TestStore::default());
        let service = Arc::new(UsuarioService::new(
            store.clone(),
            Arc::new(assets),
            replace_strategy,
        ));

        let state = AppState {
            config: Arc::new(app_config),
            service: service.clone(),
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            service,
            asset_dir,
            _content_root: content_root,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Names of the files currently in the asset directory, sorted.
    pub fn asset_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.asset_dir)
            .expect("Failed to read asset dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Put a file straight into the asset directory.
    pub fn seed_asset(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.asset_dir.join(name), bytes).expect("Failed to seed asset");
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, content_type: &str, body: &'static str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(&self, path: &str, file_name: &str, file_bytes: Vec<u8>) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    pub async fn download(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    /// Create a usuario via the API and return its `id`. An image name is
    /// written straight to the store, since the API only sets images on upload.
    pub async fn create_usuario(&self, theme: &str, image: Option<&str>) -> i32 {
        let body = serde_json::json!({
            "tema": theme,
            "local": "Belo Horizonte",
            "dataEvento": "2026-11-20T19:00:00Z",
            "qtdPessoas": 120,
            "telefone": "31 99999-0000",
            "email": "contato@eventos.dev",
            "redesSociais": [
                { "nome": "Instagram", "url": "https://instagram.com/eventos" }
            ],
        });

        let res = self.post(routes::USUARIOS, &body).await;
        assert_eq!(res.status, 200, "create_usuario failed: {}", res.text);
        let id = res.id();

        if let Some(image) = image {
            let detail = self
                .store
                .get_by_id(id, true)
                .await
                .expect("Failed to read usuario")
                .expect("usuario should exist");
            let payload = UsuarioPayload {
                image_url: Some(image.to_string()),
                ..UsuarioPayload::from(detail)
            };
            self.store
                .update(id, payload)
                .await
                .expect("Failed to set image")
                .expect("usuario should exist");
        }
        id
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn image_url(&self) -> &str {
        self.body["imagemURL"]
            .as_str()
            .expect("response body should contain 'imagemURL'")
    }
}

/// `{stem}{10 digits}{ext}`.
pub fn is_generated_name(name: &str, stem: &str, ext: &str) -> bool {
    name.len() == stem.len() + 10 + ext.len()
        && name.starts_with(stem)
        && name.ends_with(ext)
        && name[stem.len()..stem.len() + 10]
            .chars()
            .all(|c| c.is_ascii_digit())
}

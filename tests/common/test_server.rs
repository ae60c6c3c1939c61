use std::path::Path;
use std::sync::Arc;

use reportdesk::auth::Argon2Credentials;
use reportdesk::config::ServerConfig;
use reportdesk::server::{AppState, create_router};
use reportdesk::store::{SqliteStore, Store};
use reportdesk::workflow::users;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// An in-process server on an ephemeral port with a bootstrapped admin.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub client: reqwest::Client,
    server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");
        let credentials = Arc::new(Argon2Credentials::with_cost(1024, 1).expect("argon2 params"));
        users::bootstrap_admin(&store, credentials.as_ref(), ADMIN_PASSWORD)
            .expect("bootstrap admin");

        let state = AppState::new(Arc::new(store), &config)
            .expect("app state")
            .with_credentials(credentials);
        let app = create_router(Arc::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
            server,
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), 200, "login failed for {username}");

        let body: Value = resp.json().await.expect("parse login response");
        body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Registers a regular account and returns its session token.
    pub async fn register(&self, username: &str) -> String {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "username": username, "password": "pw" }))
            .send()
            .await
            .expect("register request");
        assert_eq!(resp.status(), 201, "register failed for {username}");

        let body: Value = resp.json().await.expect("parse register response");
        body["data"]["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// Names the commander through the settings endpoint.
    pub async fn set_commander(&self, admin_token: &str, username: &str) {
        let form = reqwest::multipart::Form::new().text("commander_name", username.to_string());
        let resp = self
            .client
            .put(self.url("/admin/settings"))
            .bearer_auth(admin_token)
            .multipart(form)
            .send()
            .await
            .expect("settings request");
        assert_eq!(resp.status(), 200);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use member_api::app::{app, AppState};
use member_api::auth::{Identity, SessionResolver};
use member_api::config::AppConfig;
use member_api::database::models::{NewUser, User};
use member_api::database::{MemoryUserDirectory, UserDirectory};
use member_api::types::Role;

const SECRET: &str = "integration-test-secret";

/// Server bound to a free port, backed by an in-memory directory the test can inspect
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub directory: Arc<MemoryUserDirectory>,
    sessions: SessionResolver,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let directory = Arc::new(MemoryUserDirectory::new());
        let sessions = SessionResolver::new(SECRET, 1);
        let state = AppState::new(directory.clone(), sessions.clone());
        let router = app(state, &AppConfig::development());

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { port, base_url, directory, sessions, handle };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer header value for `identity`
    pub fn bearer(&self, identity: &str) -> String {
        let token = self
            .sessions
            .issue(&Identity::new(identity))
            .expect("failed to issue test token");
        format!("Bearer {token}")
    }

    pub async fn seed(&self, identity: &str, roles: &[Role]) -> Result<User> {
        let mut user = NewUser::new(identity, chrono::Utc::now());
        user.roles = roles.to_vec();
        Ok(self.directory.insert(user).await?)
    }

    pub async fn stored(&self, identity: &str) -> Result<User> {
        self.directory
            .find_by_identity(identity)
            .await?
            .with_context(|| format!("no record for identity {}", identity))
    }

    pub async fn roles_of(&self, user: &User) -> Result<Vec<Role>> {
        let stored = self
            .directory
            .find_by_id(user.id)
            .await?
            .context("seeded user disappeared")?;
        Ok(stored.roles)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

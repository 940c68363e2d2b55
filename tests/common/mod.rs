#![allow(dead_code)]

use std::net::TcpListener as StdListener;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cropwatch_api::app::{app, AppState};
use cropwatch_api::auth::TokenService;
use cropwatch_api::config::{AppConfig, StorageBackend};
use cropwatch_api::database;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Name of the thread serving requests (kept under the 15-byte Linux limit)
pub const SERVER_THREAD: &str = "test-server";

/// Signing secret of the shared test server
pub const TOKEN_SECRET: &str = "integration-test-secret";

/// In-memory storage with the sample farmer seeded; cheap bcrypt keeps signups fast
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = None;
    config.storage.backend = StorageBackend::Memory;
    config.storage.seed_sample_data = true;
    config.api.enable_request_logging = false;
    config.security.jwt_secret = TOKEN_SECRET.to_string();
    config.security.bcrypt_cost = 4;
    config
}

/// Token service sharing the server's secret, for minting tokens directly
pub fn tokens(expiry_hours: u64) -> Result<TokenService> {
    Ok(TokenService::new(TOKEN_SECRET, expiry_hours)?)
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Serve the router on its own runtime thread. The thread is torn down
    /// with the test process, so nothing outlives the test binary.
    fn start() -> Result<Self> {
        let listener = StdListener::bind("127.0.0.1:0").context("failed to bind test listener")?;
        listener.set_nonblocking(true)?;
        let port = listener.local_addr()?.port();
        let base_url = format!("http://127.0.0.1:{}", port);
        let config = test_config();

        std::thread::Builder::new()
            .name(SERVER_THREAD.into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                    .expect("failed to build server runtime");

                runtime.block_on(async move {
                    let storage = database::build_storage(&config)
                        .await
                        .expect("failed to build memory storage");
                    let state = AppState::new(storage, config).expect("invalid test config");
                    let listener = tokio::net::TcpListener::from_std(listener)
                        .expect("failed to adopt test listener");
                    axum::serve(listener, app(state)).await.expect("test server failed");
                });
            })
            .context("failed to start server thread")?;

        Ok(Self { port, base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::start().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Username that no other test in this process will pick
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Status plus decoded JSON body
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    pub fn id(&self) -> String {
        self.body["data"]["id"]
            .as_str()
            .expect("response data carries an id")
            .to_string()
    }
}

/// HTTP client bound to the shared server, optionally carrying a bearer token
pub struct Api {
    server: &'static TestServer,
    client: Client,
    pub token: Option<String>,
}

impl Api {
    pub async fn anonymous() -> Result<Self> {
        Ok(Self {
            server: ensure_server().await?,
            client: Client::new(),
            token: None,
        })
    }

    /// Sign up a fresh account and keep its token
    pub async fn farmer(prefix: &str) -> Result<Self> {
        let mut api = Self::anonymous().await?;
        let username = unique(prefix);
        let reply = api.signup(&username, "secret-pass").await?;
        anyhow::ensure!(
            reply.status == StatusCode::CREATED,
            "signup failed: {} {}",
            reply.status,
            reply.body
        );
        api.token = reply.data()["token"].as_str().map(str::to_string);
        Ok(api)
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Reply> {
        self.post(
            "/api/auth/signup",
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
                "fullName": format!("Farmer {}", username),
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Reply> {
        self.post(
            "/api/auth/login",
            json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn get(&self, path: &str) -> Result<Reply> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Reply> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Reply> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Reply> {
        self.send(Method::DELETE, path, None).await
    }

    /// Send a raw body, for malformed JSON and content-type checks
    pub async fn raw(&self, method: Method, path: &str, content_type: &str, body: &str) -> Result<Reply> {
        let mut req = self
            .client
            .request(method, self.server.url(path))
            .header("content-type", content_type)
            .body(body.to_string());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Self::decode(req.send().await?).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Reply> {
        let mut req = self.client.request(method, self.server.url(path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        Self::decode(req.send().await?).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Reply> {
        let status = resp.status();
        let body = resp.json::<Value>().await.context("response was not JSON")?;
        Ok(Reply { status, body })
    }
}

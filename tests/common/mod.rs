#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use device_lending::app::{self, AppState};
use device_lending::config::{AppConfig, StorageBackend};
use device_lending::database::{MemoryStore, Repositories};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

// ---------------------------------------------------------------------------
// In-process router
// ---------------------------------------------------------------------------

/// Router over a fresh in-memory store with a seeded administrator
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut config = AppConfig::development();
        config.database.storage = StorageBackend::Memory;
        config.security.jwt_secret = "router-test-secret".to_string();
        config.security.bcrypt_cost = 4;
        config.security.enable_cors = false;

        let repositories = Repositories::from_store(Arc::new(MemoryStore::new()));
        let state = AppState::new(config, &repositories);
        state
            .services
            .employees
            .ensure_admin(ADMIN_USER, ADMIN_PASSWORD)
            .await
            .expect("seed admin");

        Self {
            router: app::router(state.clone()),
            state,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), body).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, user_name: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "userName": user_name, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USER, ADMIN_PASSWORD).await
    }

    /// Create a `ROLE_USER` employee and log them in
    pub async fn user_token(&self, admin: &str, user_name: &str) -> String {
        let (status, body) = self
            .post("/api/v1/employee/create", admin, employee_body(user_name, &["ROLE_USER"]))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create employee failed: {}", body);
        self.login(user_name, "password1").await
    }

    /// Returns the new device id
    pub async fn create_device(&self, admin: &str, item_name: &str, device_type: &str, rate_type: &str, original_price: f64) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/device/create",
                admin,
                device_body(item_name, device_type, rate_type, original_price),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create device failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }

    /// Returns the new employee id
    pub async fn create_employee(&self, admin: &str, user_name: &str) -> i64 {
        let (status, body) = self
            .post("/api/v1/employee/create", admin, employee_body(user_name, &["ROLE_USER"]))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create employee failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }
}

pub fn employee_body(user_name: &str, roles: &[&str]) -> Value {
    json!({
        "userName": user_name,
        "password": "password1",
        "fullName": format!("{} Example", user_name),
        "address": "12 Station Road",
        "phoneNumber": "0912345678",
        "accountBalance": 250.0,
        "roles": roles,
    })
}

pub fn device_body(item_name: &str, device_type: &str, rate_type: &str, original_price: f64) -> Value {
    json!({
        "type": device_type,
        "unitPrice": 15.0,
        "rateType": rate_type,
        "branchName": "Head Office",
        "itemName": item_name,
        "version": "1.0",
        "originalPrice": original_price,
    })
}

// ---------------------------------------------------------------------------
// Spawned binary
// ---------------------------------------------------------------------------

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_device-lending"));
        cmd.env("APP_PORT", port.to_string())
            .env("APP_HOST", "127.0.0.1")
            .env("APP_STORAGE", "memory")
            .env("JWT_SECRET", "smoke-test-secret")
            .env("SECURITY_BCRYPT_COST", "4")
            .env("APP_ADMIN_USERNAME", ADMIN_USER)
            .env("APP_ADMIN_PASSWORD", ADMIN_PASSWORD)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

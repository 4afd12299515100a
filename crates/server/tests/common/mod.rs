//! In-process test server: the real router on an ephemeral port over a temp data dir.

#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use tempfile::TempDir;

use clubhouse_api::crypto;
use clubhouse_api_client::ApiClient;
use clubhouse_runtime_config::ServerConfig;
use clubhouse_server::session::unix_now;
use clubhouse_server::storage::{self, Db};
use clubhouse_server::{build_router, AppState};

pub const JWT_SECRET: &str = "integration-secret";
pub const HOOK_SECRET: &str = "hook-secret";

pub struct TestServer {
    pub base_url: String,
    pub db: Db,
    _dir: TempDir,
}

/// Serve `app` on `127.0.0.1:0` and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Start a server with test defaults, letting the caller adjust the config.
pub async fn spawn_with(configure: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut config = ServerConfig::default();
    config.server.data_dir = dir.path().join("data");
    config.server.web_dir = dir.path().join("no-web-build");
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.auth.hook_secret = HOOK_SECRET.to_string();
    config.onboarding.plan_assign_attempts = 5;
    config.onboarding.plan_assign_delay_ms = 100;
    configure(&mut config);

    let db = storage::init_db(&config.server.data_dir).expect("init db");
    let state = AppState::new(db.clone(), config).expect("app state");
    let base_url = serve(build_router(state)).await;

    TestServer {
        base_url,
        db,
        _dir: dir,
    }
}

pub async fn spawn() -> TestServer {
    spawn_with(|_| {}).await
}

/// Access token for `user_id` signed with the test secret.
pub fn token_for(user_id: &str) -> String {
    crypto::sign_jwt(user_id, JWT_SECRET, unix_now())
}

impl TestServer {
    /// Anonymous client.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(10)).expect("api client")
    }

    /// Client signed in as `user_id`.
    pub fn client_as(&self, user_id: &str) -> ApiClient {
        let client = self.client();
        client.set_auth(token_for(user_id));
        client
    }

    pub fn exec(&self, sql: &str) {
        self.db.conn().execute_batch(sql).expect("seed sql");
    }

    pub fn add_plan(&self, id: &str, price_cents: i64, is_default: bool, sort_order: i64) {
        self.db
            .conn()
            .execute(
                "INSERT INTO plans (id, name, slug, price_cents, billing_interval, is_default, is_active, sort_order)
                 VALUES (?1, ?2, ?1, ?3, 'month', ?4, 1, ?5)",
                rusqlite::params![id, id.to_uppercase(), price_cents, is_default, sort_order],
            )
            .expect("insert plan");
    }

    pub fn add_member(&self, id: &str, plan_id: Option<&str>) {
        self.db
            .conn()
            .execute(
                "INSERT INTO profiles (id, email, full_name, plan_id) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, format!("{id}@example.com"), format!("Member {id}"), plan_id],
            )
            .expect("insert member");
    }

    pub fn add_admin(&self, id: &str) {
        self.db
            .conn()
            .execute(
                "INSERT INTO profiles (id, email, full_name, is_creator) VALUES (?1, ?2, 'Club Admin', 1)",
                rusqlite::params![id, format!("{id}@example.com")],
            )
            .expect("insert admin");
    }

    pub fn grant(&self, plan_id: &str, permission: &str, enabled: bool) {
        self.db
            .conn()
            .execute(
                "INSERT INTO plan_permissions (plan_id, permission, enabled) VALUES (?1, ?2, ?3)",
                rusqlite::params![plan_id, permission, enabled],
            )
            .expect("insert permission");
    }
}

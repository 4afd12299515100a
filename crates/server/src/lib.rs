//! clubhouse API server: membership shell, plan permissions, admin tooling.
//!
//! The binary in `main.rs` only loads configuration and calls [`build_router`];
//! integration tests drive the same router on an ephemeral port.

pub mod error;
pub mod notify;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use clubhouse_runtime_config::ServerConfig;
use notify::Notifier;
use session::AuthProvider;
use storage::Db;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<ServerConfig>,
    pub notifier: Notifier,
    pub auth_provider: AuthProvider,
}

impl AppState {
    pub fn new(db: Db, config: ServerConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.notifications.timeout_secs.max(1)))
            .build()?;
        let notifier = Notifier::new(client.clone(), config.notifications.clone());
        let auth_provider = AuthProvider::new(
            client,
            config.auth.provider_url.clone(),
            config.auth.anon_key.clone(),
        );
        Ok(Self {
            db,
            config: Arc::new(config),
            notifier,
            auth_provider,
        })
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Notifier {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}

impl FromRef<AppState> for AuthProvider {
    fn from_ref(state: &AppState) -> Self {
        state.auth_provider.clone()
    }
}

fn api_routes() -> Router<AppState> {
    use routes::{
        auth, content, groups, health, messages, plans, profile, shell, taxonomies, tools, updates,
    };

    Router::new()
        // Health
        .route("/health", get(health::health))
        // Auth provider hooks
        .route("/auth/hooks/user-created", post(auth::user_created))
        // Current member
        .route("/me", get(profile::me).put(profile::update_me))
        .route("/me/onboard", post(profile::onboard))
        .route("/me/permissions", get(profile::my_permissions))
        .route("/shell", get(shell::shell))
        // Member-facing catalogue
        .route("/plans", get(plans::list_plans))
        .route("/public/sales/{slug}", get(plans::sales_page))
        .route("/tools", get(tools::list_tools))
        .route("/content", get(content::list_published))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{id}", get(groups::get_group))
        .route("/conversations", get(messages::list_conversations))
        .route(
            "/conversations/{id}/messages",
            get(messages::list_messages),
        )
        .route("/updates", get(updates::list_updates))
        .route("/updates/{id}/read", post(updates::mark_read))
        // Admin: taxonomies
        .route(
            "/admin/taxonomies",
            get(taxonomies::list_taxonomies).post(taxonomies::create_taxonomy),
        )
        .route(
            "/admin/taxonomies/{id}",
            get(taxonomies::get_taxonomy)
                .put(taxonomies::update_taxonomy)
                .delete(taxonomies::delete_taxonomy),
        )
        // Admin: content moderation
        .route(
            "/admin/content",
            get(content::list_all).post(content::create_content),
        )
        .route(
            "/admin/content/{id}/toggle-status",
            post(content::toggle_status),
        )
        .route(
            "/admin/content/{id}",
            axum::routing::delete(content::delete_content),
        )
        // Admin: groups
        .route("/admin/groups", post(groups::create_group))
        .route(
            "/admin/groups/{id}",
            put(groups::update_group).delete(groups::delete_group),
        )
        // Admin: direct messages
        .route("/admin/messages", post(messages::send_admin_message))
        // Admin: navigation
        .route(
            "/admin/settings/navigation",
            get(shell::navigation_settings).put(shell::update_navigation),
        )
        // Admin: plans, tools, sales pages, updates
        .route(
            "/admin/plans/{id}/permissions",
            get(plans::plan_permissions).put(plans::update_plan_permissions),
        )
        .route("/admin/tools", post(tools::create_tool))
        .route("/admin/tools/{id}/access", put(tools::set_tool_access))
        .route("/admin/sales-pages/{slug}", put(plans::upsert_sales_page))
        .route("/admin/updates", post(updates::create_update))
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new().nest("/api", api_routes());

    // Serve static files from web build if present
    let web_dir = state.config.server.web_dir.clone();
    if web_dir.exists() {
        tracing::info!("serving static files from {}", web_dir.display());
        let index_html = web_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(&web_dir).fallback(ServeFile::new(index_html)));
    }

    app.layer(middleware::from_fn_with_state(
        state.clone(),
        session::refresh_session,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .with_state(state)
}

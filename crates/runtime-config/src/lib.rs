//! Server configuration types.
//!
//! `clubhouse-server` reads `clubhouse.toml` into [`ServerConfig`], then applies
//! environment overrides so container deployments can skip the file entirely.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "clubhouse.toml";

/// Environment variable naming an alternative config path.
pub const CONFIG_PATH_ENV: &str = "CLUBHOUSE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Top-level server configuration (persisted as `clubhouse.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub onboarding: OnboardingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL; defaults to `http://localhost:{port}`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Static frontend build served as the fallback route when it exists.
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_url: String::new(),
            data_dir: default_data_dir(),
            web_dir: default_web_dir(),
        }
    }
}

impl HttpSettings {
    pub fn effective_base_url(&self) -> String {
        if self.base_url.trim().is_empty() {
            format!("http://localhost:{}", self.port)
        } else {
            self.base_url.trim_end_matches('/').to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Shared HS256 secret the auth provider signs access tokens with.
    #[serde(default)]
    pub jwt_secret: String,
    /// Auth provider base URL (token refresh endpoint lives under it).
    #[serde(default)]
    pub provider_url: String,
    /// Public API key sent to the provider as the `apikey` header.
    #[serde(default)]
    pub anon_key: String,
    /// Secret the provider sends with the user-created hook.
    #[serde(default)]
    pub hook_secret: String,
    #[serde(default = "default_access_cookie")]
    pub access_cookie: String,
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie: String,
    /// Refresh when the access token expires within this many seconds.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            provider_url: String::new(),
            anon_key: String::new(),
            hook_secret: String::new(),
            access_cookie: default_access_cookie(),
            refresh_cookie: default_refresh_cookie(),
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// New-message webhook. Empty disables notifications.
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default)]
    pub bearer_token: String,
    #[serde(default)]
    pub shared_secret: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            bearer_token: String::new(),
            shared_secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotificationSettings {
    pub fn enabled(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingSettings {
    #[serde(default = "default_plan_assign_attempts")]
    pub plan_assign_attempts: u32,
    #[serde(default = "default_plan_assign_delay_ms")]
    pub plan_assign_delay_ms: u64,
}

impl Default for OnboardingSettings {
    fn default() -> Self {
        Self {
            plan_assign_attempts: default_plan_assign_attempts(),
            plan_assign_delay_ms: default_plan_assign_delay_ms(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_port() -> u16 {
    3000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_web_dir() -> PathBuf {
    PathBuf::from("web/build")
}
fn default_access_cookie() -> String {
    "clubhouse-access-token".to_string()
}
fn default_refresh_cookie() -> String {
    "clubhouse-refresh-token".to_string()
}
fn default_refresh_margin_secs() -> u64 {
    60
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_plan_assign_attempts() -> u32 {
    5
}
fn default_plan_assign_delay_ms() -> u64 {
    500
}

// ── Loading ─────────────────────────────────────────────────────────────

/// Resolve the config path from `CLUBHOUSE_CONFIG` (via `lookup`) or the default name.
pub fn config_path(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup(CONFIG_PATH_ENV)
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Read a config file. A missing file yields defaults.
pub fn load_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ServerConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply environment overrides. Empty values are ignored.
///
/// `lookup` is `std::env::var(..).ok()` in production and a map in tests.
pub fn apply_env_overrides(
    config: &mut ServerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: "PORT",
            value: port.clone(),
        })?;
    }
    if let Some(v) = get("BASE_URL") {
        config.server.base_url = v;
    }
    if let Some(v) = get("CLUBHOUSE_DATA_DIR") {
        config.server.data_dir = PathBuf::from(v);
    }
    if let Some(v) = get("CLUBHOUSE_WEB_DIR") {
        config.server.web_dir = PathBuf::from(v);
    }

    let strings: [(&str, &mut String); 7] = [
        ("JWT_SECRET", &mut config.auth.jwt_secret),
        ("AUTH_PROVIDER_URL", &mut config.auth.provider_url),
        ("AUTH_ANON_KEY", &mut config.auth.anon_key),
        ("AUTH_HOOK_SECRET", &mut config.auth.hook_secret),
        ("NOTIFY_WEBHOOK_URL", &mut config.notifications.webhook_url),
        ("NOTIFY_BEARER_TOKEN", &mut config.notifications.bearer_token),
        ("NOTIFY_SHARED_SECRET", &mut config.notifications.shared_secret),
    ];
    for (key, slot) in strings {
        if let Some(v) = get(key) {
            *slot = v;
        }
    }

    Ok(())
}

/// File (or defaults) plus environment, the way the server binary loads it.
pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<ServerConfig, ConfigError> {
    let path = config_path(&lookup);
    let mut config = load_file(&path)?;
    apply_env_overrides(&mut config, &lookup)?;
    Ok(config)
}

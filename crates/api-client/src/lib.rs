pub mod client;
pub mod permissions;

pub use client::ApiClient;
pub use clubhouse_api;
pub use permissions::PermissionWatcher;

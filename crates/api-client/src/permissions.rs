//! Keeps the signed-in member's plan permissions current.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use clubhouse_api::PlanPermissions;

use crate::ApiClient;

/// Recomputes permissions whenever the client's auth state changes
/// (sign-in, token change, sign-out) and publishes the latest map.
///
/// Without a token, or when the lookup fails, every flag is off.
pub struct PermissionWatcher {
    rx: watch::Receiver<PlanPermissions>,
    task: JoinHandle<()>,
}

impl PermissionWatcher {
    /// Start watching `client`'s auth state. Must be called inside a Tokio runtime.
    pub fn spawn(client: ApiClient) -> Self {
        let (tx, rx) = watch::channel(PlanPermissions::none());
        let mut auth_rx = client.subscribe_auth();

        let task = tokio::spawn(async move {
            loop {
                let signed_in = auth_rx.borrow_and_update().is_some();
                let permissions = if signed_in {
                    match client.my_permissions().await {
                        Ok(permissions) => permissions,
                        Err(e) => {
                            tracing::warn!("permission lookup failed: {e}");
                            PlanPermissions::none()
                        }
                    }
                } else {
                    PlanPermissions::none()
                };
                tx.send_replace(permissions);

                if auth_rx.changed().await.is_err() {
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// Latest published permissions.
    pub fn current(&self) -> PlanPermissions {
        *self.rx.borrow()
    }

    /// Receiver for reacting to permission changes.
    pub fn subscribe(&self) -> watch::Receiver<PlanPermissions> {
        self.rx.clone()
    }
}

impl Drop for PermissionWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

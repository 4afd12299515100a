//! New-message notification webhook.

use clubhouse_api::MessageNotification;
use clubhouse_runtime_config::NotificationSettings;
use tokio::task::JoinHandle;

/// Sends `{recipient_user_id, sender_name}` to the configured webhook.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    settings: NotificationSettings,
}

impl Notifier {
    pub fn new(client: reqwest::Client, settings: NotificationSettings) -> Self {
        Self { client, settings }
    }

    pub fn enabled(&self) -> bool {
        self.settings.enabled()
    }

    /// POST the notification and fail on a non-2xx answer.
    pub async fn send(&self, payload: &MessageNotification) -> anyhow::Result<()> {
        self.client
            .post(&self.settings.webhook_url)
            .bearer_auth(&self.settings.bearer_token)
            .header("x-webhook-secret", &self.settings.shared_secret)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fire-and-forget delivery on a detached task. Returns `None` when disabled.
    pub fn notify_detached(&self, payload: MessageNotification) -> Option<JoinHandle<()>> {
        if !self.enabled() {
            return None;
        }
        let notifier = self.clone();
        Some(tokio::spawn(async move {
            match notifier.send(&payload).await {
                Ok(()) => tracing::debug!(
                    recipient = %payload.recipient_user_id,
                    "message notification delivered"
                ),
                Err(e) => tracing::warn!(
                    recipient = %payload.recipient_user_id,
                    "message notification failed: {e}"
                ),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_webhook_url() {
        let notifier = Notifier::new(reqwest::Client::new(), NotificationSettings::default());
        assert!(!notifier.enabled());
        let handle = notifier.notify_detached(MessageNotification {
            recipient_user_id: "u2".into(),
            sender_name: "Admin".into(),
        });
        assert!(handle.is_none());
    }
}

//! Chat notifications.
//!
//! Posts are best-effort: a delivery failure is logged together with the
//! original message so nothing is lost, but it never fails the request that
//! triggered it.

use serde_json::json;

use crate::config::SlackConfig;

#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url: config.webhook_url.clone(),
        }
    }

    pub async fn safe_post(&self, channel: &str, message: &str) {
        if let Err(e) = self.post(channel, message).await {
            tracing::error!(
                channel = %channel,
                message = %message,
                error = %e,
                "Slack error"
            );
        }
    }

    async fn post(&self, channel: &str, message: &str) -> Result<(), anyhow::Error> {
        let Some(url) = &self.webhook_url else {
            // No webhook configured (dev / tests): keep the message visible.
            tracing::info!(channel = %channel, "{}", message);
            return Ok(());
        };

        let payload = json!({
            "channel": channel,
            "text": message,
            "icon_emoji": ":beaker:",
            "username": "Beaker (engineering-minion)",
        });

        let response = self.http.post(url).json(&payload).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_client_never_errors() {
        let client = SlackClient::new(&SlackConfig {
            webhook_url: None,
            notification_channel: "#portal-alerts".to_string(),
        });
        // Must not panic or hang.
        client.safe_post("#portal-alerts", "new collaborator added").await;
    }
}

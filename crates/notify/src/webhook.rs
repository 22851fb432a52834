//! Discord webhook notifier.
//!
//! Posts `{ "embeds": [embed] }` to `{base}/{id}/{token}`. Discord answers
//! 204 (or 200 with `?wait=true`). Anything else is a rejection.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::embed::{Embed, NotificationTemplates};
use crate::event::NotificationEvent;
use crate::notifier::{Notifier, NotifyError};

pub const DEFAULT_BASE_URL: &str = "https://discord.com/api/webhooks";
/// Upper bound on a single delivery, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct WebhookPayload<'a> {
    embeds: [&'a Embed; 1],
}

/// Discord webhook credentials split out of the full URL.
#[derive(Debug, Clone)]
pub struct WebhookTarget {
    pub id: String,
    pub token: String,
    /// Override for tests or proxies; defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
}

pub struct DiscordWebhook {
    client: reqwest::Client,
    endpoint: String,
    templates: NotificationTemplates,
}

impl DiscordWebhook {
    pub fn new(
        target: WebhookTarget,
        templates: NotificationTemplates,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;
        Ok(Self::with_client(client, target, templates))
    }

    pub fn with_client(
        client: reqwest::Client,
        target: WebhookTarget,
        templates: NotificationTemplates,
    ) -> Self {
        let base = target
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            client,
            endpoint: format!(
                "{}/{}/{}",
                base.trim_end_matches('/'),
                target.id,
                target.token
            ),
            templates,
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        let embed = self.templates.render(&event, Utc::now());
        let body = WebhookPayload { embeds: [&embed] };

        tracing::debug!(kind = %event.kind(), "sending discord webhook");
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if is_accepted(status) {
            tracing::debug!(kind = %event.kind(), status = status.as_u16(), "discord webhook sent");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

fn is_accepted(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 204)
}

impl Notifier for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    fn send(
        &self,
        event: NotificationEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + '_>> {
        Box::pin(self.post(event))
    }
}

//! HTTP notification delivery

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::errors::DeployError;
use crate::notifier::target::NotifyTarget;
use crate::utils::hostname;

/// PushDeer message endpoint
pub const PUSHDEER_ENDPOINT: &str = "https://api2.pushdeer.com/message/push";

/// Something that can deliver a completion message to a target string
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Fire-and-forget delivery. Never fails.
    async fn notify(&self, message: &str, target: &str);
}

/// Delivers notifications over HTTP
pub struct Notifier {
    client: Client,
    hostname: String,
    pushdeer_endpoint: String,
}

impl Notifier {
    /// Create a notifier tagging messages with this host's name
    pub fn new() -> Result<Self, DeployError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            hostname: hostname(),
            pushdeer_endpoint: PUSHDEER_ENDPOINT.to_string(),
        })
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_pushdeer_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.pushdeer_endpoint = endpoint.into();
        self
    }

    /// `[<hostname>] <message>`
    pub fn format_message(&self, message: &str) -> String {
        format!("[{}] {}", self.hostname, message)
    }

    /// Deliver to a parsed target, surfacing transport errors
    pub async fn deliver(&self, message: &str, target: &NotifyTarget) -> Result<(), DeployError> {
        let text = self.format_message(message);

        match target {
            NotifyTarget::Webhook(url) => {
                self.client
                    .get(url)
                    .query(&[("text", text.as_str())])
                    .send()
                    .await?
                    .error_for_status()?;
            }
            NotifyTarget::PushDeer(key) => {
                self.client
                    .post(&self.pushdeer_endpoint)
                    .query(&[("pushkey", key.expose_secret()), ("text", text.as_str())])
                    .send()
                    .await?
                    .error_for_status()?;
            }
            // TODO: wire up the Telegram bot API and Lark webhooks
            NotifyTarget::Telegram(_) | NotifyTarget::Lark(_) => {
                return Err(DeployError::UnsupportedTransport(target.kind().to_string()));
            }
            NotifyTarget::Unknown(_) => {}
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn notify(&self, message: &str, target: &str) {
        let Some(target) = NotifyTarget::parse(target) else {
            return;
        };
        if let Err(DeployError::UnsupportedTransport(kind)) = self.deliver(message, &target).await {
            debug!("Notification via {} is not implemented yet", kind);
        }
    }
}

//! Run-outcome notifications.
//!
//! Each scrape run ends in exactly one notification: an error for a failed run
//! or a success carrying the number of listings actually saved.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use super::nats::NatsPublisher;

/// Payload published for each finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Notification {
    Error {
        site_name: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    Success {
        site_name: String,
        count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Delivers run outcomes. Callers log delivery failures and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_error(&self, site_name: &str, error: &str) -> Result<()>;

    async fn notify_success(&self, site_name: &str, count: usize) -> Result<()>;
}

/// Publishes notifications as JSON on one NATS subject.
pub struct NatsNotifier {
    publisher: Arc<dyn NatsPublisher>,
    subject: String,
}

impl NatsNotifier {
    pub fn new(publisher: Arc<dyn NatsPublisher>, subject: impl Into<String>) -> Self {
        Self {
            publisher,
            subject: subject.into(),
        }
    }

    async fn publish(&self, notification: &Notification) -> Result<()> {
        let payload = serde_json::to_vec(notification).context("Failed to encode notification")?;
        self.publisher
            .publish(self.subject.clone(), Bytes::from(payload))
            .await
            .with_context(|| format!("Failed to publish to {}", self.subject))
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn notify_error(&self, site_name: &str, error: &str) -> Result<()> {
        self.publish(&Notification::Error {
            site_name: site_name.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        })
        .await
    }

    async fn notify_success(&self, site_name: &str, count: usize) -> Result<()> {
        self.publish(&Notification::Success {
            site_name: site_name.to_string(),
            count,
            timestamp: Utc::now(),
        })
        .await
    }
}

/// In-memory notifier for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RwLock<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.sent.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, notification: Notification) {
        self.sent
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_error(&self, site_name: &str, error: &str) -> Result<()> {
        self.record(Notification::Error {
            site_name: site_name.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn notify_success(&self, site_name: &str, count: usize) -> Result<()> {
        self.record(Notification::Success {
            site_name: site_name.to_string(),
            count,
            timestamp: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::nats::TestNats;

    #[tokio::test]
    async fn test_success_payload_shape() {
        let nats = Arc::new(TestNats::new());
        let notifier = NatsNotifier::new(nats.clone(), "scraper.notifications");

        notifier.notify_success("rumah123", 4).await.unwrap();

        let msgs = nats.messages_for_subject("scraper.notifications");
        assert_eq!(msgs.len(), 1);
        let value: serde_json::Value = nats.deserialize_message(&msgs[0]).unwrap();
        assert_eq!(value["type"], "success");
        assert_eq!(value["site_name"], "rumah123");
        assert_eq!(value["count"], 4);
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_error_payload_shape() {
        let nats = Arc::new(TestNats::new());
        let notifier = NatsNotifier::new(nats.clone(), "scraper.notifications");

        notifier.notify_error("rumah123", "HTTP 503").await.unwrap();

        let msgs = nats.published_messages();
        let parsed: Notification = nats.deserialize_message(&msgs[0]).unwrap();
        match parsed {
            Notification::Error { site_name, error, .. } => {
                assert_eq!(site_name, "rumah123");
                assert_eq!(error, "HTTP 503");
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delivery_failure_is_returned() {
        let notifier = NatsNotifier::new(Arc::new(TestNats::failing()), "scraper.notifications");
        assert!(notifier.notify_success("rumah123", 1).await.is_err());
    }
}

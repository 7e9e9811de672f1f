//! NATS producer mirroring persisted alerts to the alert subject.

use crate::types::Alert;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Publishes alerts for downstream consumers (dashboards, alert views).
/// The persisted alert row is the source of truth; publishing is
/// best-effort on top of it.
#[derive(Clone)]
pub struct AlertProducer {
    client: Client,
    subject: String,
}

impl AlertProducer {
    /// Create a new alert producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish an alert
    pub async fn publish(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %alert.id,
            transaction_id = %alert.transaction_id,
            severity = ?alert.severity,
            "Published alert"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}

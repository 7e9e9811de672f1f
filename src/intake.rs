//! NATS intake for transaction-created events.
//!
//! The transaction creator persists the row (status PENDING), returns it
//! to its caller, and emits a created event on the intake subject exactly
//! once. This module is the pipeline's side of that contract: subscribe,
//! decode, hand the transaction to the dispatcher.

use crate::types::TransactionCreateRequest;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Decode a transaction-created event payload.
pub fn decode_event(payload: &[u8]) -> Result<TransactionCreateRequest> {
    serde_json::from_slice(payload).context("decoding transaction-created event")
}

/// Subscriber for the transaction intake subject
pub struct TransactionIntake {
    client: Client,
    subject: String,
}

impl TransactionIntake {
    /// Create a new intake subscriber
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the intake subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to transaction intake subject");
        Ok(subscriber)
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_event() {
        let payload = br#"{
            "user_id": "u1",
            "amount": 23.4,
            "date": "2026-02-01T09:30:00Z",
            "merchant": "Starbucks",
            "description": "Team lunch"
        }"#;

        let request = decode_event(payload).unwrap();
        assert_eq!(request.user_id, "u1");
        assert_eq!(request.amount, 23.4);
        assert_eq!(request.merchant.as_deref(), Some("Starbucks"));
        assert_eq!(request.currency, "USD");
    }

    #[test]
    fn test_decode_rejects_malformed_payload() {
        assert!(decode_event(b"not json").is_err());
        assert!(decode_event(br#"{"amount": 10.0}"#).is_err());
    }
}

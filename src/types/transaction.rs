//! Transaction data structures for the scoring pipeline

use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a transaction.
///
/// The pipeline only ever performs the `Pending` -> `Flagged` transition;
/// `Approved` and `Rejected` are set by human review outside the pipeline
/// and are never reverted by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Flagged,
    Approved,
    Rejected,
}

/// Whether the scoring pipeline has finished for this transaction.
///
/// `Incomplete` means at least one stage failed mid-run; the transaction
/// carries whatever fields the earlier stages persisted. Consumers must
/// treat `Pending`/`Incomplete` as "not scored", never as "low risk".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringState {
    Pending,
    Complete,
    Incomplete,
}

/// A financial transaction threaded through the scoring stages.
///
/// Intake fields are immutable after creation; each derived field is
/// written by exactly one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,

    /// Owner of the transaction
    pub user_id: String,

    /// Transaction amount (positive)
    pub amount: f64,

    /// ISO currency code
    pub currency: String,

    /// When the transaction occurred
    pub date: DateTime<Utc>,

    /// Free-form description
    pub description: Option<String>,

    /// Merchant name
    pub merchant: Option<String>,

    /// Where the transaction came from (manual entry, bank feed, ...)
    pub source: String,

    /// Spending category, written by the categorizer
    pub category: Option<String>,

    /// Categorization confidence in [0, 1], written by the categorizer.
    /// A fixed constant when the rule table is used; not calibrated.
    pub classification_confidence: Option<f64>,

    /// Set by the anomaly detector when the Z-score test trips
    pub is_anomaly: bool,

    /// Z-score of the amount against the historical window
    pub anomaly_score: Option<f64>,

    /// Human-readable explanation of the anomaly
    pub anomaly_reason: Option<String>,

    /// Additive risk score, written by the risk decider
    pub risk_score: Option<f64>,

    /// Short codes explaining each risk contribution, in scoring order
    pub risk_factors: Vec<String>,

    /// Review status
    pub status: TransactionStatus,

    /// Pipeline completion marker
    pub scoring: ScoringState,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire payload of a transaction-created event consumed from the intake
/// subject. The creator persists and returns the transaction before the
/// pipeline runs, so none of the derived fields appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCreateRequest {
    pub user_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_source() -> String {
    "manual".to_string()
}

impl TransactionCreateRequest {
    /// Build a fresh `Pending` transaction from the intake event.
    pub fn into_transaction(self) -> Result<Transaction> {
        ensure!(
            self.amount > 0.0,
            "transaction amount must be positive, got {}",
            self.amount
        );

        let now = Utc::now();
        Ok(Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            amount: self.amount,
            currency: self.currency,
            date: self.date,
            description: self.description,
            merchant: self.merchant,
            source: self.source,
            category: None,
            classification_confidence: None,
            is_anomaly: false,
            anomaly_score: None,
            anomaly_reason: None,
            risk_score: None,
            risk_factors: Vec::new(),
            status: TransactionStatus::Pending,
            scoring: ScoringState::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

impl Transaction {
    /// Create a persisted-looking transaction with the given core fields.
    /// Intended for seeding historical windows in tests and tooling.
    pub fn new(user_id: &str, amount: f64, date: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            amount,
            currency: "USD".to_string(),
            date,
            description: None,
            merchant: None,
            source: "manual".to_string(),
            category: None,
            classification_confidence: None,
            is_anomaly: false,
            anomaly_score: None,
            anomaly_reason: None,
            risk_score: None,
            risk_factors: Vec::new(),
            status: TransactionStatus::Pending,
            scoring: ScoringState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same as [`Transaction::new`] but with the category already assigned,
    /// as historical rows in the store always are.
    pub fn with_category(user_id: &str, amount: f64, date: DateTime<Utc>, category: &str) -> Self {
        let mut tx = Self::new(user_id, amount, date);
        tx.category = Some(category.to_string());
        tx
    }
}

//! Rule-based transaction categorization.
//!
//! A deterministic keyword fallback in place of an intelligent classifier:
//! case-insensitive substring match of merchant and description text
//! against a fixed rule table, first match wins. Rule order is part of the
//! contract.

use crate::store::TransactionStore;
use crate::types::Transaction;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Confidence reported whenever the rule table produced the category.
/// A fixed constant, not a statistical measure; callers must not treat it
/// as calibrated.
pub const RULE_CONFIDENCE: f64 = 0.85;

struct Rule {
    category: &'static str,
    merchant_keywords: &'static [&'static str],
    description_keywords: &'static [&'static str],
}

/// Ordered rule table; earlier rules win.
const RULES: &[Rule] = &[
    Rule {
        category: "meals",
        merchant_keywords: &["starbucks", "restaurant"],
        description_keywords: &["lunch", "dinner"],
    },
    Rule {
        category: "transportation",
        merchant_keywords: &["uber", "lyft"],
        description_keywords: &["taxi", "transport"],
    },
    Rule {
        category: "travel",
        merchant_keywords: &["hotel", "airline"],
        description_keywords: &["flight", "hotel"],
    },
];

const FALLBACK_CATEGORY: &str = "other";

/// Categorize from merchant and description text.
///
/// Pure function: same inputs always yield the same category. Missing
/// fields are treated as empty text.
pub fn categorize(merchant: Option<&str>, description: Option<&str>) -> (&'static str, f64) {
    let merchant = merchant.map(str::to_lowercase).unwrap_or_default();
    let description = description.map(str::to_lowercase).unwrap_or_default();

    for rule in RULES {
        let merchant_hit = rule.merchant_keywords.iter().any(|kw| merchant.contains(kw));
        let description_hit = rule
            .description_keywords
            .iter()
            .any(|kw| description.contains(kw));

        if merchant_hit || description_hit {
            return (rule.category, RULE_CONFIDENCE);
        }
    }

    (FALLBACK_CATEGORY, RULE_CONFIDENCE)
}

/// Categorization stage: writes category + confidence and persists.
pub struct Categorizer {
    transactions: Arc<dyn TransactionStore>,
}

impl Categorizer {
    pub fn new(transactions: Arc<dyn TransactionStore>) -> Self {
        Self { transactions }
    }

    pub async fn run(&self, tx: &mut Transaction) -> Result<()> {
        let (category, confidence) =
            categorize(tx.merchant.as_deref(), tx.description.as_deref());

        tx.category = Some(category.to_string());
        tx.classification_confidence = Some(confidence);

        self.transactions
            .save(tx)
            .await
            .context("persisting categorized transaction")?;

        info!(transaction_id = %tx.id, category, "Transaction categorized");
        Ok(())
    }
}

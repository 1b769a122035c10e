//! Batch transaction processing
//!
//! Posts a list of type-tagged transactions one by one, in submission order.
//! Each item is decoded, defaulted and posted on its own; whatever goes wrong
//! with one item (bad shape, unknown tag, engine rejection, panic) is recorded
//! as that item's outcome and the batch moves on.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};

use crate::domain::{ReferenceGenerator, TransactionType};
use crate::engine::EngineHandle;
use crate::error::{panic_message, AppError};
use crate::handlers::postings::PostingDraft;

/// Message for an item that could not be decoded at all
pub const INVALID_ITEM_MESSAGE: &str = "Invalid transaction data";
pub const POSTED_MESSAGE: &str = "Transaction posted";

/// One batch item as submitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub account_reference: Option<String>,
    pub net_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
    pub bank_nominal: Option<String>,
    pub details: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
}

impl BatchItem {
    fn into_draft(self) -> PostingDraft {
        PostingDraft {
            account: self.account_reference,
            net_amount: self.net_amount,
            tax_amount: self.tax_amount,
            nominal_code: self.nominal_code,
            tax_code: self.tax_code,
            bank_nominal: self.bank_nominal,
            details: self.details,
            reference: self.reference,
            date: self.date,
        }
    }
}

/// Outcome of a single item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub success: bool,
    pub reference: Option<String>,
    pub message: String,
}

impl BatchOutcome {
    fn posted(reference: String) -> Self {
        Self {
            success: true,
            reference: Some(reference),
            message: POSTED_MESSAGE.to_string(),
        }
    }

    fn failed(reference: Option<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            reference,
            message: message.into(),
        }
    }
}

/// Aggregate result; `results` is in submission order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<BatchOutcome>,
}

impl BatchResult {
    fn record(&mut self, outcome: BatchOutcome) {
        if outcome.success {
            self.success_count += 1;
        } else {
            self.fail_count += 1;
        }
        self.results.push(outcome);
    }
}

/// Batch processor over the shared engine session
pub struct BatchProcessor<'a> {
    engine: &'a EngineHandle,
    references: &'a ReferenceGenerator,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(engine: &'a EngineHandle, references: &'a ReferenceGenerator) -> Self {
        Self { engine, references }
    }

    /// Process every item. Never fails: per-item errors become outcomes.
    pub fn process(&self, items: Vec<Value>) -> BatchResult {
        let mut result = BatchResult::default();

        for (index, raw) in items.into_iter().enumerate() {
            let declared_reference = raw
                .get("reference")
                .and_then(Value::as_str)
                .map(str::to_string);

            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| self.process_item(raw))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(index, error = %message, "Batch item panicked");
                    BatchOutcome::failed(declared_reference, message)
                }
            };

            if !outcome.success {
                tracing::debug!(index, message = %outcome.message, "Batch item failed");
            }
            result.record(outcome);
        }

        tracing::info!(
            success_count = result.success_count,
            fail_count = result.fail_count,
            "Batch processed"
        );
        result
    }

    fn process_item(&self, raw: Value) -> BatchOutcome {
        let item: BatchItem = match serde_json::from_value(raw) {
            Ok(item) => item,
            Err(_) => return BatchOutcome::failed(None, INVALID_ITEM_MESSAGE),
        };

        let tag = item.kind.clone().unwrap_or_default();
        let Some(kind) = TransactionType::from_tag(&tag) else {
            return BatchOutcome::failed(
                item.reference.clone(),
                format!("Unknown transaction type: {}", tag.trim()),
            );
        };

        let declared_reference = item.reference.clone();
        let posting = match item
            .into_draft()
            .into_posting(kind, "accountReference", self.references)
        {
            Ok(posting) => posting,
            Err(err) => return BatchOutcome::failed(declared_reference, err.to_string()),
        };

        match self.engine.call(|engine| engine.post_transaction(&posting)) {
            Ok(receipt) => BatchOutcome::posted(receipt.reference),
            Err(err) => BatchOutcome::failed(
                Some(posting.reference.clone()),
                AppError::from(err).to_string(),
            ),
        }
    }
}

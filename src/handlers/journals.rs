//! Journal Handlers
//!
//! Multi-line and two-line (simple) nominal journals. Line shape is checked
//! here; whether debits equal credits is left to the engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{
    date_or_today, optional_bounded, positive_amount, required_bounded, tax_code_or,
    MAX_DETAILS_LEN, MAX_NOMINAL_CODE_LEN, MAX_REFERENCE_LEN,
};
use crate::api::{Reply, RequestContext};
use crate::domain::transaction::JOURNAL_PREFIX;
use crate::engine::{Journal, JournalLine};
use crate::error::{AppError, AppResult};

/// Journals default to outside the scope of VAT
const JOURNAL_TAX_CODE: &str = "T9";
const MIN_JOURNAL_LINES: usize = 2;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLineRequest {
    pub nominal_code: Option<String>,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub details: Option<String>,
    pub tax_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRequest {
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    pub details: Option<String>,
    #[serde(default)]
    pub lines: Vec<JournalLineRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleJournalRequest {
    pub debit_nominal: Option<String>,
    pub credit_nominal: Option<String>,
    pub amount: Option<Decimal>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalResponse {
    pub transaction_id: u64,
    pub reference: String,
    pub line_count: usize,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

fn validate_line(index: usize, line: JournalLineRequest) -> AppResult<JournalLine> {
    let field = |name: &str| format!("lines[{}].{}", index, name);

    let nominal_code = required_bounded(
        &field("nominalCode"),
        line.nominal_code,
        MAX_NOMINAL_CODE_LEN,
    )?;
    let debit = line.debit.unwrap_or(Decimal::ZERO);
    let credit = line.credit.unwrap_or(Decimal::ZERO);

    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "lines[{}] amounts must not be negative",
            index
        )));
    }
    if (debit > Decimal::ZERO) == (credit > Decimal::ZERO) {
        return Err(AppError::validation(format!(
            "lines[{}] must have exactly one of debit or credit",
            index
        )));
    }

    Ok(JournalLine {
        nominal_code,
        debit,
        credit,
        details: optional_bounded(&field("details"), line.details, MAX_DETAILS_LEN)?,
        tax_code: tax_code_or(line.tax_code, JOURNAL_TAX_CODE),
    })
}

fn post(ctx: &RequestContext<'_>, journal: Journal) -> AppResult<Reply> {
    let receipt = ctx.engine().call(|engine| engine.post_journal(&journal))?;

    let total_debit = journal.lines.iter().map(|line| line.debit).sum();
    let total_credit = journal.lines.iter().map(|line| line.credit).sum();
    tracing::info!(
        reference = %receipt.reference,
        lines = journal.lines.len(),
        "Journal posted"
    );

    Reply::created(&JournalResponse {
        transaction_id: receipt.transaction_id,
        reference: receipt.reference,
        line_count: journal.lines.len(),
        total_debit,
        total_credit,
    })
}

/// POST /api/journals
pub fn post_journal(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: JournalRequest = ctx.body()?;

    if req.lines.len() < MIN_JOURNAL_LINES {
        return Err(AppError::validation(format!(
            "Journals need at least {} lines",
            MIN_JOURNAL_LINES
        )));
    }

    let lines = req
        .lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| validate_line(index, line))
        .collect::<AppResult<Vec<_>>>()?;
    let reference = optional_bounded("reference", req.reference, MAX_REFERENCE_LEN)?;

    let journal = Journal {
        reference: ctx.reference(reference, JOURNAL_PREFIX),
        date: date_or_today(req.date),
        details: optional_bounded("details", req.details, MAX_DETAILS_LEN)?,
        lines,
    };
    post(ctx, journal)
}

/// POST /api/journals/simple
pub fn post_simple_journal(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: SimpleJournalRequest = ctx.body()?;

    let debit_nominal = required_bounded("debitNominal", req.debit_nominal, MAX_NOMINAL_CODE_LEN)?;
    let credit_nominal =
        required_bounded("creditNominal", req.credit_nominal, MAX_NOMINAL_CODE_LEN)?;
    let amount = positive_amount("amount", req.amount)?;
    let details = optional_bounded("details", req.details, MAX_DETAILS_LEN)?;
    let reference = optional_bounded("reference", req.reference, MAX_REFERENCE_LEN)?;

    let line = |nominal_code: String, debit: Decimal, credit: Decimal| JournalLine {
        nominal_code,
        debit,
        credit,
        details: details.clone(),
        tax_code: JOURNAL_TAX_CODE.to_string(),
    };

    let journal = Journal {
        reference: ctx.reference(reference, JOURNAL_PREFIX),
        date: date_or_today(req.date),
        lines: vec![
            line(debit_nominal, amount, Decimal::ZERO),
            line(credit_nominal, Decimal::ZERO, amount),
        ],
        details,
    };
    post(ctx, journal)
}

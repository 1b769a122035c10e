//! Ledger query handlers

use chrono::Utc;

use crate::api::request::optional_account_ref;
use crate::api::{Reply, RequestContext};
use crate::domain::{AccountKind, TransactionType};
use crate::engine::{LedgerQuery, LedgerScope};
use crate::error::{AppError, AppResult};

const DEFAULT_SEARCH_LIMIT: usize = 100;

fn ledger_query(ctx: &RequestContext<'_>, scope: LedgerScope) -> AppResult<LedgerQuery> {
    let kind = ctx
        .query
        .get("type")
        .map(|tag| {
            TransactionType::from_tag(tag)
                .ok_or_else(|| AppError::validation(format!("Unknown transaction type: {}", tag)))
        })
        .transpose()?;

    Ok(LedgerQuery {
        scope,
        account: optional_account_ref("account", ctx.query.get("account"))?,
        kind,
        from: ctx.query.date("from"),
        to: ctx.query.date("to"),
        limit: ctx.query.limit(DEFAULT_SEARCH_LIMIT),
    })
}

fn search(ctx: &RequestContext<'_>, scope: LedgerScope) -> AppResult<Reply> {
    let query = ledger_query(ctx, scope)?;
    let records = ctx
        .engine()
        .call(|engine| engine.search_transactions(&query))?;
    Reply::ok(&records)
}

fn aged(ctx: &RequestContext<'_>, kind: AccountKind) -> AppResult<Reply> {
    let as_of = ctx
        .query
        .date("to")
        .unwrap_or_else(|| Utc::now().date_naive());
    let balances = ctx
        .engine()
        .call(|engine| engine.aged_balances(kind, as_of))?;
    Reply::ok(&balances)
}

/// GET /api/search/salesledger
pub fn search_sales_ledger(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    search(ctx, LedgerScope::Sales)
}

/// GET /api/search/purchaseledger
pub fn search_purchase_ledger(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    search(ctx, LedgerScope::Purchase)
}

/// GET /api/transactions
pub fn search_transactions(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    search(ctx, LedgerScope::All)
}

/// GET /api/ageddebtors
pub fn aged_debtors(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    aged(ctx, AccountKind::Customer)
}

/// GET /api/agedcreditors
pub fn aged_creditors(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    aged(ctx, AccountKind::Supplier)
}

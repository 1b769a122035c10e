//! Payment allocation handler

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{account_ref, positive_amount, required_bounded, MAX_REFERENCE_LEN};
use crate::api::{Reply, RequestContext};
use crate::domain::{AccountKind, AccountRef};
use crate::engine::Allocation;
use crate::error::{AppError, AppResult};
use crate::provisioning::require_account;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub account_type: Option<String>,
    pub account: Option<String>,
    pub payment_reference: Option<String>,
    pub invoice_reference: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub account_type: AccountKind,
    pub account: AccountRef,
    pub payment_reference: String,
    pub invoice_reference: String,
    pub amount: Decimal,
    pub allocated: bool,
}

fn account_type(value: Option<String>) -> AppResult<AccountKind> {
    match value.as_deref().map(|value| value.trim().to_lowercase()).as_deref() {
        Some("customer") => Ok(AccountKind::Customer),
        Some("supplier") => Ok(AccountKind::Supplier),
        _ => Err(AppError::validation(
            "accountType must be customer or supplier",
        )),
    }
}

/// POST /api/payments/allocate
pub fn allocate_payment(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: AllocationRequest = ctx.body()?;

    let allocation = Allocation {
        kind: account_type(req.account_type)?,
        account: account_ref("account", req.account.as_deref())?,
        payment_reference: required_bounded(
            "paymentReference",
            req.payment_reference,
            MAX_REFERENCE_LEN,
        )?,
        invoice_reference: required_bounded(
            "invoiceReference",
            req.invoice_reference,
            MAX_REFERENCE_LEN,
        )?,
        amount: positive_amount("amount", req.amount)?,
    };

    ctx.engine().call(|engine| -> AppResult<()> {
        require_account(engine, allocation.kind, &allocation.account)?;
        Ok(engine.allocate_payment(&allocation)?)
    })?;

    tracing::info!(
        account_ref = %allocation.account,
        payment = %allocation.payment_reference,
        invoice = %allocation.invoice_reference,
        amount = %allocation.amount,
        "Payment allocated"
    );

    Reply::ok(&AllocationResponse {
        account_type: allocation.kind,
        account: allocation.account,
        payment_reference: allocation.payment_reference,
        invoice_reference: allocation.invoice_reference,
        amount: allocation.amount,
        allocated: true,
    })
}

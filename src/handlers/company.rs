//! Company & reference data handlers

use serde::Serialize;

use crate::api::{Reply, RequestContext};
use crate::engine::ReferenceKind;
use crate::error::AppResult;

/// Version of this gateway
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub gateway_version: &'static str,
    pub engine_version: String,
}

/// GET /api/company
pub fn company(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let company = ctx.engine().call(|engine| engine.company())?;
    Reply::ok(&company)
}

/// GET /api/status
pub fn status(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let status = ctx.engine().call(|engine| engine.status())?;
    Reply::ok(&status)
}

/// GET /api/version
pub fn version(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let status = ctx.engine().call(|engine| engine.status())?;
    Reply::ok(&VersionResponse {
        gateway_version: GATEWAY_VERSION,
        engine_version: status.engine_version,
    })
}

/// GET /api/setup
pub fn setup(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let setup = ctx.engine().call(|engine| engine.setup())?;
    Reply::ok(&setup)
}

/// GET /api/financialyear
pub fn financial_year(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let year = ctx.engine().call(|engine| engine.financial_year())?;
    Reply::ok(&year)
}

fn reference_list(ctx: &RequestContext<'_>, kind: ReferenceKind) -> AppResult<Reply> {
    let items = ctx.engine().call(|engine| engine.reference_list(kind))?;
    Reply::ok(&items)
}

/// GET /api/taxcodes
pub fn tax_codes(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::TaxCodes)
}

/// GET /api/currencies
pub fn currencies(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::Currencies)
}

/// GET /api/departments
pub fn departments(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::Departments)
}

/// GET /api/banks
pub fn banks(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::Banks)
}

/// GET /api/paymentmethods
pub fn payment_methods(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::PaymentMethods)
}

/// GET /api/coa
pub fn chart_of_accounts(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    reference_list(ctx, ReferenceKind::ChartOfAccounts)
}

//! Posting Handlers
//!
//! Sales, purchase and bank postings. Every single-line posting goes through
//! [`PostingDraft`], which applies the per-type defaults; the batch
//! processor uses the same draft so a batch item and its standalone endpoint
//! behave identically.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{
    account_ref, date_or_today, nominal_or, non_negative_amount, optional_bounded,
    positive_amount, tax_code_or, MAX_DETAILS_LEN, MAX_REFERENCE_LEN,
};
use crate::api::{Reply, RequestContext};
use crate::domain::{reference_or_generate, ReferenceGenerator, TransactionType};
use crate::engine::{Posting, PostingReceipt};
use crate::error::AppResult;
use crate::provisioning::{ensure_account, require_account, Provisioned};

/// Raw posting fields as they arrive in a request
#[derive(Debug, Clone, Default)]
pub struct PostingDraft {
    pub account: Option<String>,
    pub net_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
    pub bank_nominal: Option<String>,
    pub details: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
}

impl PostingDraft {
    /// Validate the draft and fill in the defaults for `kind`.
    ///
    /// `account_field` names the account property in error messages; it is
    /// ignored for bank postings, which have no account.
    pub fn into_posting(
        self,
        kind: TransactionType,
        account_field: &str,
        references: &ReferenceGenerator,
    ) -> AppResult<Posting> {
        let account = match kind.account_kind() {
            Some(_) => Some(account_ref(account_field, self.account.as_deref())?),
            None => None,
        };

        let net_amount = positive_amount("netAmount", self.net_amount)?;
        let tax_amount = non_negative_amount("taxAmount", self.tax_amount)?;
        let nominal_code = nominal_or("nominalCode", self.nominal_code, kind.default_nominal())?;
        let bank_nominal = match kind.default_bank_nominal() {
            Some(default) => Some(nominal_or("bankNominal", self.bank_nominal, default)?),
            None => None,
        };
        let tax_code = tax_code_or(self.tax_code, kind.default_tax_code());
        let details = optional_bounded("details", self.details, MAX_DETAILS_LEN)?;
        let reference = optional_bounded("reference", self.reference, MAX_REFERENCE_LEN)?;

        Ok(Posting {
            kind,
            account,
            nominal_code,
            bank_nominal,
            net_amount,
            tax_amount,
            tax_code,
            details,
            reference: reference_or_generate(reference, kind.reference_prefix(), references),
            date: date_or_today(self.date),
        })
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPostingRequest {
    pub customer_account: Option<String>,
    pub net_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
    pub details: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub auto_create_customer: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPostingRequest {
    pub supplier_account: Option<String>,
    pub net_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
    pub details: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub auto_create_supplier: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankPostingRequest {
    pub bank_nominal: Option<String>,
    pub net_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
    pub details: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingResponse {
    pub transaction_id: u64,
    pub reference: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub account_ref: Option<String>,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    pub account_created: bool,
}

impl PostingResponse {
    fn new(posting: &Posting, receipt: PostingReceipt, provisioned: Option<Provisioned>) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            reference: receipt.reference,
            kind: posting.kind,
            account_ref: posting.account.as_ref().map(ToString::to_string),
            net_amount: posting.net_amount,
            tax_amount: posting.tax_amount,
            account_created: provisioned == Some(Provisioned::Created),
        }
    }
}

impl From<CustomerPostingRequest> for PostingDraft {
    fn from(req: CustomerPostingRequest) -> Self {
        Self {
            account: req.customer_account,
            net_amount: req.net_amount,
            tax_amount: req.tax_amount,
            nominal_code: req.nominal_code,
            tax_code: req.tax_code,
            bank_nominal: None,
            details: req.details,
            reference: req.reference,
            date: req.date,
        }
    }
}

impl From<SupplierPostingRequest> for PostingDraft {
    fn from(req: SupplierPostingRequest) -> Self {
        Self {
            account: req.supplier_account,
            net_amount: req.net_amount,
            tax_amount: req.tax_amount,
            nominal_code: req.nominal_code,
            tax_code: req.tax_code,
            bank_nominal: None,
            details: req.details,
            reference: req.reference,
            date: req.date,
        }
    }
}

impl From<BankPostingRequest> for PostingDraft {
    fn from(req: BankPostingRequest) -> Self {
        Self {
            account: None,
            net_amount: req.net_amount,
            tax_amount: req.tax_amount,
            nominal_code: req.nominal_code,
            tax_code: req.tax_code,
            bank_nominal: req.bank_nominal,
            details: req.details,
            reference: req.reference,
            date: req.date,
        }
    }
}

// =========================================================================
// Handlers
// =========================================================================

/// How the account behind a posting is made available
#[derive(Debug, Clone, Copy)]
enum AccountPolicy {
    /// Bank postings carry no account
    None,
    /// The account must already exist
    Require,
    /// Provision the account, creating it when the flag allows
    Provision { auto_create: bool },
}

fn post(
    ctx: &RequestContext<'_>,
    draft: PostingDraft,
    kind: TransactionType,
    account_field: &str,
    policy: AccountPolicy,
) -> AppResult<Reply> {
    let posting = draft.into_posting(kind, account_field, ctx.references())?;

    let (provisioned, receipt) = ctx.engine().call(|engine| -> AppResult<_> {
        let provisioned = match (policy, kind.account_kind(), &posting.account) {
            (AccountPolicy::Provision { auto_create }, Some(ledger), Some(account)) => {
                Some(ensure_account(engine, ledger, account, auto_create)?)
            }
            (AccountPolicy::Require, Some(ledger), Some(account)) => {
                require_account(engine, ledger, account)?;
                Some(Provisioned::Existing)
            }
            _ => None,
        };
        let receipt = engine.post_transaction(&posting)?;
        Ok((provisioned, receipt))
    })?;

    tracing::info!(
        kind = posting.kind.tag(),
        reference = %receipt.reference,
        transaction_id = receipt.transaction_id,
        net_amount = %posting.net_amount,
        "Transaction posted"
    );

    Reply::created(&PostingResponse::new(&posting, receipt, provisioned))
}

fn post_customer(
    ctx: &RequestContext<'_>,
    kind: TransactionType,
    provision: bool,
) -> AppResult<Reply> {
    let req: CustomerPostingRequest = ctx.body()?;
    let policy = if provision {
        AccountPolicy::Provision {
            auto_create: req.auto_create_customer,
        }
    } else {
        AccountPolicy::Require
    };
    post(ctx, req.into(), kind, "customerAccount", policy)
}

fn post_supplier(
    ctx: &RequestContext<'_>,
    kind: TransactionType,
    provision: bool,
) -> AppResult<Reply> {
    let req: SupplierPostingRequest = ctx.body()?;
    let policy = if provision {
        AccountPolicy::Provision {
            auto_create: req.auto_create_supplier,
        }
    } else {
        AccountPolicy::Require
    };
    post(ctx, req.into(), kind, "supplierAccount", policy)
}

fn post_bank(ctx: &RequestContext<'_>, kind: TransactionType) -> AppResult<Reply> {
    let req: BankPostingRequest = ctx.body()?;
    post(ctx, req.into(), kind, "account", AccountPolicy::None)
}

/// POST /api/sales/invoice
pub fn sales_invoice(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_customer(ctx, TransactionType::SI, true)
}

/// POST /api/sales/credit
pub fn sales_credit(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_customer(ctx, TransactionType::SC, false)
}

/// POST /api/sales/receipt
pub fn sales_receipt(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_customer(ctx, TransactionType::SR, false)
}

/// POST /api/purchases/invoice
pub fn purchase_invoice(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_supplier(ctx, TransactionType::PI, true)
}

/// POST /api/purchases/credit
pub fn purchase_credit(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_supplier(ctx, TransactionType::PC, false)
}

/// POST /api/purchases/payment
pub fn purchase_payment(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_supplier(ctx, TransactionType::PP, false)
}

/// POST /api/bank/payment
pub fn bank_payment(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_bank(ctx, TransactionType::BP)
}

/// POST /api/bank/receipt
pub fn bank_receipt(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    post_bank(ctx, TransactionType::BR)
}

//! Customer & Supplier Handlers
//!
//! Both ledgers share one implementation parameterized by [`AccountKind`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{account_ref, non_negative_amount, optional_bounded, required_bounded};
use crate::api::{Reply, RequestContext};
use crate::domain::{AccountKind, AccountRef};
use crate::engine::{Address, ListFilter, NewAccount};
use crate::error::{AppError, AppResult};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_NAME_LEN: usize = 60;
const MAX_CONTACT_FIELD_LEN: usize = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub account_ref: Option<String>,
    pub name: Option<String>,
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub contact_name: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub credit_limit: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistsResponse {
    pub account_ref: AccountRef,
    pub exists: bool,
}

impl CreateAccountRequest {
    fn validate(self) -> AppResult<NewAccount> {
        let account_ref = account_ref("accountRef", self.account_ref.as_deref())?;
        let name = required_bounded("name", self.name, MAX_NAME_LEN)?;

        let contact = |field: &str, value: Option<String>| {
            optional_bounded(field, value, MAX_CONTACT_FIELD_LEN)
        };

        Ok(NewAccount {
            account_ref,
            name,
            address: Address {
                street1: contact("street1", self.street1)?,
                street2: contact("street2", self.street2)?,
                town: contact("town", self.town)?,
                county: contact("county", self.county)?,
                postcode: contact("postcode", self.postcode)?,
            },
            contact_name: contact("contactName", self.contact_name)?,
            telephone: contact("telephone", self.telephone)?,
            email: contact("email", self.email)?,
            credit_limit: non_negative_amount("creditLimit", self.credit_limit)?,
        })
    }
}

fn path_account(ctx: &RequestContext<'_>) -> AppResult<AccountRef> {
    account_ref("accountRef", Some(ctx.param("accountRef")?))
}

fn not_found(kind: AccountKind, account: &AccountRef) -> AppError {
    AppError::not_found(format!("{} account {} not found", kind.title(), account))
}

fn list(ctx: &RequestContext<'_>, kind: AccountKind) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let accounts = ctx
        .engine()
        .call(|engine| engine.list_accounts(kind, &filter))?;
    Reply::ok(&accounts)
}

fn get(ctx: &RequestContext<'_>, kind: AccountKind) -> AppResult<Reply> {
    let account = path_account(ctx)?;
    let record = ctx
        .engine()
        .call(|engine| engine.find_account(kind, &account))?
        .ok_or_else(|| not_found(kind, &account))?;
    Reply::ok(&record)
}

fn exists(ctx: &RequestContext<'_>, kind: AccountKind) -> AppResult<Reply> {
    let account = path_account(ctx)?;
    let exists = ctx
        .engine()
        .call(|engine| engine.account_exists(kind, &account))?;
    Reply::ok(&ExistsResponse {
        account_ref: account,
        exists,
    })
}

fn create(ctx: &RequestContext<'_>, kind: AccountKind) -> AppResult<Reply> {
    let req: CreateAccountRequest = ctx.body()?;
    let account = req.validate()?;

    let created = ctx.engine().call(|engine| -> AppResult<_> {
        if engine.account_exists(kind, &account.account_ref)? {
            return Err(AppError::validation(format!(
                "{} account {} already exists",
                kind.title(),
                account.account_ref
            )));
        }
        engine.create_account(kind, &account)?;
        engine
            .find_account(kind, &account.account_ref)?
            .ok_or_else(|| not_found(kind, &account.account_ref))
    })?;

    tracing::info!(
        kind = kind.as_str(),
        account_ref = %created.account_ref,
        "Account created"
    );
    Reply::created(&created)
}

/// GET /api/customers
pub fn list_customers(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    list(ctx, AccountKind::Customer)
}

/// POST /api/customers
pub fn create_customer(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    create(ctx, AccountKind::Customer)
}

/// GET /api/customers/{accountRef}
pub fn get_customer(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    get(ctx, AccountKind::Customer)
}

/// GET /api/customers/{accountRef}/exists
pub fn customer_exists(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    exists(ctx, AccountKind::Customer)
}

/// GET /api/customers/{accountRef}/addresses
pub fn customer_addresses(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let account = path_account(ctx)?;
    let addresses = ctx.engine().call(|engine| -> AppResult<_> {
        if !engine.account_exists(AccountKind::Customer, &account)? {
            return Err(not_found(AccountKind::Customer, &account));
        }
        Ok(engine.account_addresses(AccountKind::Customer, &account)?)
    })?;
    Reply::ok(&addresses)
}

/// GET /api/suppliers
pub fn list_suppliers(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    list(ctx, AccountKind::Supplier)
}

/// POST /api/suppliers
pub fn create_supplier(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    create(ctx, AccountKind::Supplier)
}

/// GET /api/suppliers/{accountRef}
pub fn get_supplier(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    get(ctx, AccountKind::Supplier)
}

/// GET /api/suppliers/{accountRef}/exists
pub fn supplier_exists(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    exists(ctx, AccountKind::Supplier)
}

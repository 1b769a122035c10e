//! Account provisioning
//!
//! Check-exists / auto-create for customer and supplier accounts.
//!
//! Both functions take the engine session directly so the caller can run the
//! existence check, the optional create, and the dependent operation inside
//! a single [`EngineHandle::call`](crate::engine::EngineHandle::call). No
//! other request can touch the engine between those steps.

use crate::domain::{AccountKind, AccountRef};
use crate::engine::{AccountingEngine, NewAccount};
use crate::error::{AppError, AppResult};

/// How an account came to be available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Existing,
    Created,
}

/// Make sure `account` exists in the `kind` ledger.
///
/// A missing account is a 404 unless `auto_create` is set, in which case a
/// placeholder is created. A rejected create is a provisioning failure and
/// the caller must not go on to its dependent operation.
pub fn ensure_account(
    engine: &mut dyn AccountingEngine,
    kind: AccountKind,
    account: &AccountRef,
    auto_create: bool,
) -> AppResult<Provisioned> {
    if engine.account_exists(kind, account)? {
        return Ok(Provisioned::Existing);
    }

    if !auto_create {
        return Err(AppError::not_found(format!(
            "{} account {} not found. Set {} to true to create it automatically.",
            kind.title(),
            account,
            kind.auto_create_flag()
        )));
    }

    tracing::warn!(
        kind = kind.as_str(),
        account_ref = %account,
        "Auto-creating missing account"
    );

    engine
        .create_account(kind, &NewAccount::placeholder(account.clone()))
        .map_err(|err| AppError::Provisioning {
            kind,
            reference: account.to_string(),
            reason: err.to_string(),
        })?;

    Ok(Provisioned::Created)
}

/// Lookup for operations that never auto-create
pub fn require_account(
    engine: &mut dyn AccountingEngine,
    kind: AccountKind,
    account: &AccountRef,
) -> AppResult<()> {
    if engine.account_exists(kind, account)? {
        Ok(())
    } else {
        Err(AppError::not_found(format!(
            "{} account {} not found",
            kind.title(),
            account
        )))
    }
}

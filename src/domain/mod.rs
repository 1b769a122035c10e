//! Domain module
//!
//! Value types shared by the request layer and the engine facade.

pub mod account_ref;
pub mod reference;
pub mod transaction;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use account_ref::{AccountRef, AccountRefError, MAX_ACCOUNT_REF_LEN};
pub use reference::{reference_or_generate, ReferenceGenerator};
pub use transaction::TransactionType;

/// Which ledger an account belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Customer,
    Supplier,
}

impl AccountKind {
    /// Lowercase name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Customer => "customer",
            AccountKind::Supplier => "supplier",
        }
    }

    /// Capitalized name used at the start of messages
    pub fn title(&self) -> &'static str {
        match self {
            AccountKind::Customer => "Customer",
            AccountKind::Supplier => "Supplier",
        }
    }

    /// Request flag that enables auto-creation for this ledger
    pub fn auto_create_flag(&self) -> &'static str {
        match self {
            AccountKind::Customer => "autoCreateCustomer",
            AccountKind::Supplier => "autoCreateSupplier",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

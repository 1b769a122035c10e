//! Transaction types
//!
//! Ledger postings are tagged with a two-letter type code. Each type carries
//! the defaults applied when a request omits its nominal code, tax code or
//! reference.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::AccountKind;

pub const SALES_NOMINAL: &str = "4000";
pub const PURCHASE_NOMINAL: &str = "5000";
pub const BANK_NOMINAL: &str = "1200";
pub const STANDARD_TAX_CODE: &str = "T1";
pub const ZERO_TAX_CODE: &str = "T0";

/// Reference prefix for journals
pub const JOURNAL_PREFIX: &str = "JNL";

/// Reference prefix for stock adjustments
pub const STOCK_ADJUSTMENT_PREFIX: &str = "ADJ";

/// Postable transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Sales invoice
    SI,
    /// Sales credit note
    SC,
    /// Sales receipt
    SR,
    /// Purchase invoice
    PI,
    /// Purchase credit note
    PC,
    /// Purchase payment
    PP,
    /// Bank payment
    BP,
    /// Bank receipt
    BR,
}

impl TransactionType {
    pub const ALL: [TransactionType; 8] = [
        Self::SI,
        Self::SC,
        Self::SR,
        Self::PI,
        Self::PC,
        Self::PP,
        Self::BP,
        Self::BR,
    ];

    /// Resolve a type tag, ignoring case and surrounding whitespace
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag().eq_ignore_ascii_case(tag))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::SI => "SI",
            Self::SC => "SC",
            Self::SR => "SR",
            Self::PI => "PI",
            Self::PC => "PC",
            Self::PP => "PP",
            Self::BP => "BP",
            Self::BR => "BR",
        }
    }

    /// Prefix used for generated references
    pub fn reference_prefix(&self) -> &'static str {
        self.tag()
    }

    /// Ledger whose account the posting is made against (None for bank postings)
    pub fn account_kind(&self) -> Option<AccountKind> {
        match self {
            Self::SI | Self::SC | Self::SR => Some(AccountKind::Customer),
            Self::PI | Self::PC | Self::PP => Some(AccountKind::Supplier),
            Self::BP | Self::BR => None,
        }
    }

    pub fn default_nominal(&self) -> &'static str {
        match self {
            Self::SI | Self::SC | Self::BR => SALES_NOMINAL,
            Self::PI | Self::PC | Self::BP => PURCHASE_NOMINAL,
            Self::SR | Self::PP => BANK_NOMINAL,
        }
    }

    pub fn default_tax_code(&self) -> &'static str {
        match self {
            Self::SR | Self::PP => ZERO_TAX_CODE,
            _ => STANDARD_TAX_CODE,
        }
    }

    /// Bank nominal paired with the posting, for bank payments and receipts
    pub fn default_bank_nominal(&self) -> Option<&'static str> {
        match self {
            Self::BP | Self::BR => Some(BANK_NOMINAL),
            _ => None,
        }
    }

    /// Whether this type leaves an outstanding balance on the account
    pub fn is_invoice(&self) -> bool {
        matches!(self, Self::SI | Self::PI)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_is_case_insensitive() {
        assert_eq!(TransactionType::from_tag("si"), Some(TransactionType::SI));
        assert_eq!(TransactionType::from_tag(" Bp "), Some(TransactionType::BP));
    }

    #[test]
    fn test_from_tag_unknown() {
        assert_eq!(TransactionType::from_tag("XX"), None);
        assert_eq!(TransactionType::from_tag(""), None);
    }

    #[test]
    fn test_sales_defaults() {
        assert_eq!(TransactionType::SI.default_nominal(), "4000");
        assert_eq!(TransactionType::SI.default_tax_code(), "T1");
        assert_eq!(TransactionType::SI.account_kind(), Some(AccountKind::Customer));
    }

    #[test]
    fn test_purchase_defaults() {
        assert_eq!(TransactionType::PI.default_nominal(), "5000");
        assert_eq!(TransactionType::PI.account_kind(), Some(AccountKind::Supplier));
    }

    #[test]
    fn test_receipts_use_bank_and_zero_tax() {
        assert_eq!(TransactionType::SR.default_nominal(), "1200");
        assert_eq!(TransactionType::PP.default_tax_code(), "T0");
    }

    #[test]
    fn test_bank_postings_have_bank_nominal_and_no_account() {
        assert_eq!(TransactionType::BP.default_bank_nominal(), Some("1200"));
        assert_eq!(TransactionType::BR.default_bank_nominal(), Some("1200"));
        assert_eq!(TransactionType::BR.default_nominal(), "4000");
        assert!(TransactionType::BP.account_kind().is_none());
        assert!(TransactionType::SI.default_bank_nominal().is_none());
    }
}

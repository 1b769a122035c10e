//! Account reference type
//!
//! Customer and supplier accounts are keyed by a short reference. References
//! are validated before any lookup or create call reaches the engine: they are
//! trimmed, uppercased and limited to 8 characters. An over-long reference is
//! rejected, never truncated.

use serde::{Serialize, Serializer};
use std::fmt;

/// Maximum length of an account reference
pub const MAX_ACCOUNT_REF_LEN: usize = 8;

/// A validated, normalized account reference.
///
/// # Example
/// ```
/// use ledger_gateway::domain::AccountRef;
///
/// let account = AccountRef::parse(" abc123 ").unwrap();
/// assert_eq!(account.as_str(), "ABC123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountRef(String);

/// Errors that can occur when parsing an account reference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountRefError {
    #[error("Account reference is empty")]
    Empty,

    #[error("Account reference exceeds {MAX_ACCOUNT_REF_LEN} characters (got {0})")]
    TooLong(usize),
}

impl AccountRef {
    /// Parse and normalize a raw reference.
    ///
    /// # Errors
    /// - `AccountRefError::Empty` if the reference is blank
    /// - `AccountRefError::TooLong` if longer than 8 characters after trimming
    pub fn parse(raw: &str) -> Result<Self, AccountRefError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AccountRefError::Empty);
        }

        let len = trimmed.chars().count();
        if len > MAX_ACCOUNT_REF_LEN {
            return Err(AccountRefError::TooLong(len));
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for AccountRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uppercases() {
        let account = AccountRef::parse("abc123").unwrap();
        assert_eq!(account.as_str(), "ABC123");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let account = AccountRef::parse("  smith01 ").unwrap();
        assert_eq!(account.to_string(), "SMITH01");
    }

    #[test]
    fn test_parse_accepts_exactly_eight() {
        assert!(AccountRef::parse("ABCDEFGH").is_ok());
    }

    #[test]
    fn test_parse_rejects_too_long() {
        assert_eq!(
            AccountRef::parse("ABCDEFGHI"),
            Err(AccountRefError::TooLong(9))
        );
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(AccountRef::parse(""), Err(AccountRefError::Empty));
        assert_eq!(AccountRef::parse("   "), Err(AccountRefError::Empty));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let account = AccountRef::parse("acme").unwrap();
        assert_eq!(serde_json::to_string(&account).unwrap(), "\"ACME\"");
    }
}

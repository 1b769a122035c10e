//! Accounting Engine Facade
//!
//! The accounting engine is an external, session-oriented application. This
//! module defines the capability surface the gateway consumes from it, the
//! record types exchanged, and the shared session handle.
//!
//! Engine calls report failure through `EngineResult`; there are no
//! structured error codes, only the engine's message.

mod memory;
mod session;
mod types;

use chrono::NaiveDate;

use crate::domain::{AccountKind, AccountRef};

pub use memory::{InMemoryEngine, SandboxControls, SANDBOX_ENGINE_VERSION};
pub use session::EngineHandle;
pub use types::*;

/// Result of an engine call
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine refused the operation
    #[error("{0}")]
    Rejected(String),

    /// The session to the engine is not usable
    #[error("Accounting engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Capabilities consumed from the accounting engine.
///
/// Implementations are not assumed to be safe for concurrent use; callers go
/// through [`EngineHandle`], which serializes access.
pub trait AccountingEngine: Send {
    fn status(&mut self) -> EngineResult<EngineStatus>;
    fn company(&mut self) -> EngineResult<CompanyInfo>;
    fn setup(&mut self) -> EngineResult<SetupInfo>;
    fn financial_year(&mut self) -> EngineResult<FinancialYear>;
    fn reference_list(&mut self, kind: ReferenceKind) -> EngineResult<Vec<ReferenceItem>>;

    // Customer & supplier ledgers
    fn account_exists(&mut self, kind: AccountKind, account: &AccountRef) -> EngineResult<bool>;
    fn find_account(
        &mut self,
        kind: AccountKind,
        account: &AccountRef,
    ) -> EngineResult<Option<LedgerAccount>>;
    fn list_accounts(
        &mut self,
        kind: AccountKind,
        filter: &ListFilter,
    ) -> EngineResult<Vec<LedgerAccount>>;
    fn create_account(&mut self, kind: AccountKind, account: &NewAccount) -> EngineResult<()>;
    fn account_addresses(
        &mut self,
        kind: AccountKind,
        account: &AccountRef,
    ) -> EngineResult<Vec<Address>>;

    // Nominal ledger
    fn nominal_exists(&mut self, code: &str) -> EngineResult<bool>;
    fn list_nominals(&mut self, filter: &ListFilter) -> EngineResult<Vec<NominalAccount>>;
    fn create_nominal(&mut self, nominal: &NewNominal) -> EngineResult<()>;

    // Postings
    fn post_transaction(&mut self, posting: &Posting) -> EngineResult<PostingReceipt>;
    fn post_journal(&mut self, journal: &Journal) -> EngineResult<PostingReceipt>;
    fn allocate_payment(&mut self, allocation: &Allocation) -> EngineResult<()>;

    // Ledger queries
    fn search_transactions(&mut self, query: &LedgerQuery) -> EngineResult<Vec<TransactionRecord>>;
    fn aged_balances(
        &mut self,
        kind: AccountKind,
        as_of: NaiveDate,
    ) -> EngineResult<Vec<AgedBalance>>;

    // Products & stock
    fn list_products(&mut self, filter: &ListFilter) -> EngineResult<Vec<Product>>;
    fn find_product(&mut self, code: &str) -> EngineResult<Option<Product>>;
    fn create_product(&mut self, product: &NewProduct) -> EngineResult<()>;
    fn update_product(&mut self, code: &str, update: &ProductUpdate) -> EngineResult<()>;
    fn delete_product(&mut self, code: &str) -> EngineResult<()>;
    fn adjust_stock(&mut self, adjustment: &StockAdjustment) -> EngineResult<PostingReceipt>;

    // Orders
    fn list_orders(&mut self, kind: OrderKind, filter: &ListFilter) -> EngineResult<Vec<Order>>;
    fn find_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<Option<Order>>;
    fn create_order(&mut self, kind: OrderKind, order: &NewOrder) -> EngineResult<Order>;
    fn update_order(
        &mut self,
        kind: OrderKind,
        number: u32,
        update: &OrderUpdate,
    ) -> EngineResult<()>;
    fn delete_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<()>;
    fn complete_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<PostingReceipt>;

    // Projects
    fn list_projects(&mut self, filter: &ListFilter) -> EngineResult<Vec<Project>>;
    fn create_project(&mut self, project: &NewProject) -> EngineResult<()>;
    fn project_cost_codes(&mut self) -> EngineResult<Vec<ReferenceItem>>;
}

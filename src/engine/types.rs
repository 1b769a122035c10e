//! Engine record types
//!
//! Values passed to and returned from the accounting engine. Output records
//! serialize in camelCase because they are returned to API callers as-is.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{AccountKind, AccountRef, TransactionType};

// =========================================================================
// Company & reference data
// =========================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub connected: bool,
    pub company_name: String,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub address: Address,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub vat_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupInfo {
    pub base_currency: String,
    pub vat_registered: bool,
    pub default_tax_code: String,
    pub debtors_control_nominal: String,
    pub creditors_control_nominal: String,
    pub default_bank_nominal: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialYear {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Reference-data listings exposed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    TaxCodes,
    Currencies,
    Departments,
    Banks,
    PaymentMethods,
    ChartOfAccounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
}

impl ReferenceItem {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            rate: None,
        }
    }

    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }
}

// =========================================================================
// Customer & supplier accounts
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub town: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerAccount {
    pub account_ref: AccountRef,
    pub name: String,
    pub balance: Decimal,
    pub credit_limit: Decimal,
    pub address: Address,
    pub contact_name: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
}

/// Marker written to the first address line of auto-created accounts
pub const AUTO_CREATED_ADDRESS_MARKER: &str = "Auto-created via API";

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_ref: AccountRef,
    pub name: String,
    pub address: Address,
    pub contact_name: Option<String>,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub credit_limit: Decimal,
}

impl NewAccount {
    pub fn new(account_ref: AccountRef, name: String) -> Self {
        Self {
            account_ref,
            name,
            address: Address::default(),
            contact_name: None,
            telephone: None,
            email: None,
            credit_limit: Decimal::ZERO,
        }
    }

    /// Minimal account used when a posting auto-creates its target
    pub fn placeholder(account_ref: AccountRef) -> Self {
        let name = format!("Auto-created {}", account_ref);
        let mut account = Self::new(account_ref, name);
        account.address.street1 = Some(AUTO_CREATED_ADDRESS_MARKER.to_string());
        account
    }
}

/// Search and paging options shared by list calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub limit: usize,
}

impl ListFilter {
    pub fn new(search: Option<String>, limit: usize) -> Self {
        Self { search, limit }
    }

    /// Case-insensitive substring match against any of the given fields
    pub fn matches(&self, fields: &[&str]) -> bool {
        match &self.search {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                fields
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }
}

// =========================================================================
// Nominal ledger
// =========================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominalAccount {
    pub code: String,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewNominal {
    pub code: String,
    pub name: String,
}

// =========================================================================
// Postings
// =========================================================================

/// A single ledger posting (invoice, credit, receipt, payment or bank entry)
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub kind: TransactionType,
    pub account: Option<AccountRef>,
    pub nominal_code: String,
    pub bank_nominal: Option<String>,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    pub tax_code: String,
    pub details: Option<String>,
    pub reference: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingReceipt {
    pub transaction_id: u64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalLine {
    pub nominal_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub details: Option<String>,
    pub tax_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub reference: String,
    pub date: NaiveDate,
    pub details: Option<String>,
    pub lines: Vec<JournalLine>,
}

/// Allocation of a payment against an invoice on the same account
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub kind: AccountKind,
    pub account: AccountRef,
    pub payment_reference: String,
    pub invoice_reference: String,
    pub amount: Decimal,
}

// =========================================================================
// Ledger queries
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerScope {
    Sales,
    Purchase,
    All,
}

#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub scope: LedgerScope,
    pub account: Option<AccountRef>,
    pub kind: Option<TransactionType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub account_ref: Option<AccountRef>,
    pub nominal_code: String,
    pub reference: String,
    pub details: Option<String>,
    pub date: NaiveDate,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgedBalance {
    pub account_ref: AccountRef,
    pub name: String,
    pub balance: Decimal,
    pub current: Decimal,
    pub period1: Decimal,
    pub period2: Decimal,
    pub older: Decimal,
}

// =========================================================================
// Products & stock
// =========================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub code: String,
    pub description: String,
    pub sales_price: Decimal,
    pub cost_price: Decimal,
    pub quantity_in_stock: Decimal,
    pub nominal_code: String,
    pub tax_code: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub code: String,
    pub description: String,
    pub sales_price: Decimal,
    pub cost_price: Decimal,
    pub nominal_code: String,
    pub tax_code: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product_code: String,
    pub quantity: Decimal,
    pub cost_price: Option<Decimal>,
    pub reference: String,
    pub details: Option<String>,
    pub date: NaiveDate,
}

// =========================================================================
// Orders
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    Sales,
    Purchase,
}

impl OrderKind {
    pub fn account_kind(&self) -> AccountKind {
        match self {
            OrderKind::Sales => AccountKind::Customer,
            OrderKind::Purchase => AccountKind::Supplier,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            OrderKind::Sales => "Sales order",
            OrderKind::Purchase => "Purchase order",
        }
    }

    /// Transaction posted when the order is completed
    pub fn invoice_type(&self) -> TransactionType {
        match self {
            OrderKind::Sales => TransactionType::SI,
            OrderKind::Purchase => TransactionType::PI,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_code: Option<String>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub number: u32,
    pub account_ref: AccountRef,
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account: AccountRef,
    pub reference: Option<String>,
    pub date: NaiveDate,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    pub lines: Option<Vec<OrderLine>>,
}

// =========================================================================
// Projects
// =========================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub reference: String,
    pub name: String,
    pub customer_ref: Option<AccountRef>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub reference: String,
    pub name: String,
    pub customer: Option<AccountRef>,
    pub start_date: Option<NaiveDate>,
}

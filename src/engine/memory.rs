//! Sandbox Engine
//!
//! In-memory implementation of the engine facade. It keeps enough state to
//! exercise every gateway endpoint end to end, is used by the binary when no
//! real engine session is configured, and backs the test suite.
//!
//! `SandboxControls` is shared with the caller so tests can observe call
//! counts and inject faults after the engine has moved into an `EngineHandle`.

use chrono::{Datelike, Months, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::transaction::{
    BANK_NOMINAL, PURCHASE_NOMINAL, SALES_NOMINAL, STANDARD_TAX_CODE,
};
use crate::domain::{AccountKind, AccountRef, TransactionType};

use super::*;

pub const SANDBOX_ENGINE_VERSION: &str = "sandbox-1.0";

/// Observation and fault-injection switches for the sandbox engine
#[derive(Debug, Default)]
pub struct SandboxControls {
    account_creates: AtomicUsize,
    postings: AtomicUsize,
    reject_account_creates: AtomicBool,
    panic_marker: Mutex<Option<String>>,
}

impl SandboxControls {
    /// Number of `create_account` calls received (accepted or not)
    pub fn account_creates(&self) -> usize {
        self.account_creates.load(Ordering::SeqCst)
    }

    /// Number of postings accepted
    pub fn postings(&self) -> usize {
        self.postings.load(Ordering::SeqCst)
    }

    /// Make `create_account` fail
    pub fn set_reject_account_creates(&self, reject: bool) {
        self.reject_account_creates.store(reject, Ordering::SeqCst);
    }

    /// Panic inside `post_transaction` when the posting details equal `marker`
    pub fn set_panic_marker(&self, marker: Option<&str>) {
        *self.panic_marker.lock() = marker.map(str::to_string);
    }

    fn should_panic(&self, details: Option<&str>) -> bool {
        match (self.panic_marker.lock().as_deref(), details) {
            (Some(marker), Some(details)) => marker == details,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct OrderBook {
    orders: BTreeMap<u32, Order>,
    last_number: u32,
}

/// In-memory accounting engine
#[derive(Debug)]
pub struct InMemoryEngine {
    company: CompanyInfo,
    customers: BTreeMap<AccountRef, LedgerAccount>,
    suppliers: BTreeMap<AccountRef, LedgerAccount>,
    nominals: BTreeMap<String, NominalAccount>,
    products: BTreeMap<String, Product>,
    sales_orders: OrderBook,
    purchase_orders: OrderBook,
    projects: Vec<Project>,
    transactions: Vec<TransactionRecord>,
    controls: Arc<SandboxControls>,
}

impl InMemoryEngine {
    pub fn new(company_name: impl Into<String>) -> Self {
        let nominals = [
            ("1100", "Debtors Control Account"),
            (BANK_NOMINAL, "Bank Current Account"),
            ("1210", "Bank Deposit Account"),
            ("2100", "Creditors Control Account"),
            ("2200", "Sales Tax Control Account"),
            (SALES_NOMINAL, "Sales Type A"),
            (PURCHASE_NOMINAL, "Materials Purchased"),
            ("7500", "Office Stationery"),
        ]
        .into_iter()
        .map(|(code, name)| {
            (
                code.to_string(),
                NominalAccount {
                    code: code.to_string(),
                    name: name.to_string(),
                    balance: Decimal::ZERO,
                },
            )
        })
        .collect();

        Self {
            company: CompanyInfo {
                name: company_name.into(),
                address: Address::default(),
                telephone: None,
                email: None,
                vat_number: None,
            },
            customers: BTreeMap::new(),
            suppliers: BTreeMap::new(),
            nominals,
            products: BTreeMap::new(),
            sales_orders: OrderBook::default(),
            purchase_orders: OrderBook::default(),
            projects: Vec::new(),
            transactions: Vec::new(),
            controls: Arc::new(SandboxControls::default()),
        }
    }

    pub fn sandbox() -> Self {
        Self::new("Sandbox Company Ltd")
    }

    /// Shared controls handle; clone it before moving the engine into a handle
    pub fn controls(&self) -> Arc<SandboxControls> {
        self.controls.clone()
    }

    /// Seed an account directly, bypassing `create_account` bookkeeping
    pub fn with_account(mut self, kind: AccountKind, account_ref: AccountRef, name: &str) -> Self {
        let account = to_ledger_account(&NewAccount::new(account_ref.clone(), name.to_string()));
        self.ledger_mut(kind).insert(account_ref, account);
        self
    }

    /// Seed a product with an opening stock level
    pub fn with_product(mut self, product: NewProduct, quantity: Decimal) -> Self {
        self.products.insert(
            product.code.clone(),
            Product {
                code: product.code,
                description: product.description,
                sales_price: product.sales_price,
                cost_price: product.cost_price,
                quantity_in_stock: quantity,
                nominal_code: product.nominal_code,
                tax_code: product.tax_code,
            },
        );
        self
    }

    fn ledger(&self, kind: AccountKind) -> &BTreeMap<AccountRef, LedgerAccount> {
        match kind {
            AccountKind::Customer => &self.customers,
            AccountKind::Supplier => &self.suppliers,
        }
    }

    fn ledger_mut(&mut self, kind: AccountKind) -> &mut BTreeMap<AccountRef, LedgerAccount> {
        match kind {
            AccountKind::Customer => &mut self.customers,
            AccountKind::Supplier => &mut self.suppliers,
        }
    }

    fn order_book(&self, kind: OrderKind) -> &OrderBook {
        match kind {
            OrderKind::Sales => &self.sales_orders,
            OrderKind::Purchase => &self.purchase_orders,
        }
    }

    fn order_book_mut(&mut self, kind: OrderKind) -> &mut OrderBook {
        match kind {
            OrderKind::Sales => &mut self.sales_orders,
            OrderKind::Purchase => &mut self.purchase_orders,
        }
    }

    fn require_nominal(&self, code: &str) -> EngineResult<()> {
        if self.nominals.contains_key(code) {
            Ok(())
        } else {
            Err(EngineError::rejected(format!(
                "Nominal code {} does not exist",
                code
            )))
        }
    }

    fn require_tax_code(&self, code: &str) -> EngineResult<()> {
        if tax_codes().iter().any(|tax| tax.code == code) {
            Ok(())
        } else {
            Err(EngineError::rejected(format!("Tax code {} does not exist", code)))
        }
    }

    fn require_account(&self, kind: AccountKind, account: &AccountRef) -> EngineResult<()> {
        if self.ledger(kind).contains_key(account) {
            Ok(())
        } else {
            Err(EngineError::rejected(format!(
                "{} account {} does not exist",
                kind.title(),
                account
            )))
        }
    }

    fn next_transaction_id(&self) -> u64 {
        self.transactions.len() as u64 + 1
    }

    fn open_order_mut(&mut self, kind: OrderKind, number: u32) -> EngineResult<&mut Order> {
        let order = self
            .order_book_mut(kind)
            .orders
            .get_mut(&number)
            .ok_or_else(|| {
                EngineError::rejected(format!("{} {} does not exist", kind.title(), number))
            })?;

        if order.status == OrderStatus::Completed {
            return Err(EngineError::rejected(format!(
                "{} {} is already completed",
                kind.title(),
                number
            )));
        }

        Ok(order)
    }
}

impl AccountingEngine for InMemoryEngine {
    fn status(&mut self) -> EngineResult<EngineStatus> {
        Ok(EngineStatus {
            connected: true,
            company_name: self.company.name.clone(),
            engine_version: SANDBOX_ENGINE_VERSION.to_string(),
        })
    }

    fn company(&mut self) -> EngineResult<CompanyInfo> {
        Ok(self.company.clone())
    }

    fn setup(&mut self) -> EngineResult<SetupInfo> {
        Ok(SetupInfo {
            base_currency: "GBP".to_string(),
            vat_registered: true,
            default_tax_code: STANDARD_TAX_CODE.to_string(),
            debtors_control_nominal: "1100".to_string(),
            creditors_control_nominal: "2100".to_string(),
            default_bank_nominal: BANK_NOMINAL.to_string(),
        })
    }

    fn financial_year(&mut self) -> EngineResult<FinancialYear> {
        let today = Utc::now().date_naive();
        let start_year = if today.month() >= 4 {
            today.year()
        } else {
            today.year() - 1
        };

        let start_date = NaiveDate::from_ymd_opt(start_year, 4, 1)
            .ok_or_else(|| EngineError::rejected("Invalid financial year start"))?;
        let end_date = start_date
            .checked_add_months(Months::new(12))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| EngineError::rejected("Invalid financial year end"))?;

        Ok(FinancialYear {
            start_date,
            end_date,
        })
    }

    fn reference_list(&mut self, kind: ReferenceKind) -> EngineResult<Vec<ReferenceItem>> {
        let items = match kind {
            ReferenceKind::TaxCodes => tax_codes(),
            ReferenceKind::Currencies => vec![
                ReferenceItem::new("GBP", "Pound Sterling"),
                ReferenceItem::new("EUR", "Euro"),
                ReferenceItem::new("USD", "US Dollar"),
            ],
            ReferenceKind::Departments => vec![
                ReferenceItem::new("0", "Default"),
                ReferenceItem::new("1", "Sales"),
                ReferenceItem::new("2", "Purchasing"),
            ],
            ReferenceKind::Banks => vec![
                ReferenceItem::new(BANK_NOMINAL, "Bank Current Account"),
                ReferenceItem::new("1210", "Bank Deposit Account"),
            ],
            ReferenceKind::PaymentMethods => vec![
                ReferenceItem::new("CASH", "Cash"),
                ReferenceItem::new("CHEQUE", "Cheque"),
                ReferenceItem::new("BACS", "BACS"),
                ReferenceItem::new("CARD", "Credit/Debit Card"),
            ],
            ReferenceKind::ChartOfAccounts => vec![
                ReferenceItem::new("0010-0999", "Fixed Assets"),
                ReferenceItem::new("1000-1999", "Current Assets"),
                ReferenceItem::new("2000-2299", "Current Liabilities"),
                ReferenceItem::new("3000-3999", "Capital & Reserves"),
                ReferenceItem::new("4000-4999", "Sales"),
                ReferenceItem::new("5000-5999", "Purchases"),
                ReferenceItem::new("6000-6999", "Direct Expenses"),
                ReferenceItem::new("7000-9999", "Overheads"),
            ],
        };
        Ok(items)
    }

    fn account_exists(&mut self, kind: AccountKind, account: &AccountRef) -> EngineResult<bool> {
        Ok(self.ledger(kind).contains_key(account))
    }

    fn find_account(
        &mut self,
        kind: AccountKind,
        account: &AccountRef,
    ) -> EngineResult<Option<LedgerAccount>> {
        Ok(self.ledger(kind).get(account).cloned())
    }

    fn list_accounts(
        &mut self,
        kind: AccountKind,
        filter: &ListFilter,
    ) -> EngineResult<Vec<LedgerAccount>> {
        Ok(self
            .ledger(kind)
            .values()
            .filter(|account| {
                filter.matches(&[account.account_ref.as_str(), account.name.as_str()])
            })
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn create_account(&mut self, kind: AccountKind, account: &NewAccount) -> EngineResult<()> {
        self.controls.account_creates.fetch_add(1, Ordering::SeqCst);

        if self.controls.reject_account_creates.load(Ordering::SeqCst) {
            return Err(EngineError::rejected(format!(
                "{} record could not be saved",
                kind.title()
            )));
        }

        if self.ledger(kind).contains_key(&account.account_ref) {
            return Err(EngineError::rejected(format!(
                "{} account {} already exists",
                kind.title(),
                account.account_ref
            )));
        }

        self.ledger_mut(kind)
            .insert(account.account_ref.clone(), to_ledger_account(account));
        Ok(())
    }

    fn account_addresses(
        &mut self,
        kind: AccountKind,
        account: &AccountRef,
    ) -> EngineResult<Vec<Address>> {
        self.require_account(kind, account)?;
        Ok(self
            .ledger(kind)
            .get(account)
            .map(|record| vec![record.address.clone()])
            .unwrap_or_default())
    }

    fn nominal_exists(&mut self, code: &str) -> EngineResult<bool> {
        Ok(self.nominals.contains_key(code))
    }

    fn list_nominals(&mut self, filter: &ListFilter) -> EngineResult<Vec<NominalAccount>> {
        Ok(self
            .nominals
            .values()
            .filter(|nominal| filter.matches(&[nominal.code.as_str(), nominal.name.as_str()]))
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn create_nominal(&mut self, nominal: &NewNominal) -> EngineResult<()> {
        if self.nominals.contains_key(&nominal.code) {
            return Err(EngineError::rejected(format!(
                "Nominal code {} already exists",
                nominal.code
            )));
        }

        self.nominals.insert(
            nominal.code.clone(),
            NominalAccount {
                code: nominal.code.clone(),
                name: nominal.name.clone(),
                balance: Decimal::ZERO,
            },
        );
        Ok(())
    }

    fn post_transaction(&mut self, posting: &Posting) -> EngineResult<PostingReceipt> {
        if self.controls.should_panic(posting.details.as_deref()) {
            panic!("sandbox fault injected while posting {}", posting.reference);
        }

        self.require_nominal(&posting.nominal_code)?;
        if let Some(bank) = &posting.bank_nominal {
            self.require_nominal(bank)?;
        }
        self.require_tax_code(&posting.tax_code)?;

        let gross = posting.net_amount + posting.tax_amount;
        if let Some(kind) = posting.kind.account_kind() {
            let account = posting.account.as_ref().ok_or_else(|| {
                EngineError::rejected(format!(
                    "{} postings require a {} account",
                    posting.kind,
                    kind.as_str()
                ))
            })?;
            self.require_account(kind, account)?;

            let effect = match posting.kind {
                TransactionType::SI | TransactionType::PI => gross,
                _ => -gross,
            };
            if let Some(record) = self.ledger_mut(kind).get_mut(account) {
                record.balance += effect;
            }
        }

        let transaction_id = self.next_transaction_id();
        self.transactions.push(TransactionRecord {
            transaction_id,
            kind: posting.kind.tag().to_string(),
            account_ref: posting.account.clone(),
            nominal_code: posting.nominal_code.clone(),
            reference: posting.reference.clone(),
            details: posting.details.clone(),
            date: posting.date,
            net_amount: posting.net_amount,
            tax_amount: posting.tax_amount,
            outstanding: if posting.kind.is_invoice() {
                gross
            } else {
                Decimal::ZERO
            },
        });
        self.controls.postings.fetch_add(1, Ordering::SeqCst);

        Ok(PostingReceipt {
            transaction_id,
            reference: posting.reference.clone(),
        })
    }

    fn post_journal(&mut self, journal: &Journal) -> EngineResult<PostingReceipt> {
        for line in &journal.lines {
            self.require_nominal(&line.nominal_code)?;
            self.require_tax_code(&line.tax_code)?;
        }

        let debits: Decimal = journal.lines.iter().map(|line| line.debit).sum();
        let credits: Decimal = journal.lines.iter().map(|line| line.credit).sum();
        if debits != credits {
            return Err(EngineError::rejected(format!(
                "Journal does not balance: debits {}, credits {}",
                debits, credits
            )));
        }

        let first_id = self.next_transaction_id();
        for line in &journal.lines {
            let (kind, amount) = if line.debit > Decimal::ZERO {
                ("JD", line.debit)
            } else {
                ("JC", line.credit)
            };
            let transaction_id = self.next_transaction_id();
            self.transactions.push(TransactionRecord {
                transaction_id,
                kind: kind.to_string(),
                account_ref: None,
                nominal_code: line.nominal_code.clone(),
                reference: journal.reference.clone(),
                details: line.details.clone().or_else(|| journal.details.clone()),
                date: journal.date,
                net_amount: amount,
                tax_amount: Decimal::ZERO,
                outstanding: Decimal::ZERO,
            });
        }
        self.controls.postings.fetch_add(1, Ordering::SeqCst);

        Ok(PostingReceipt {
            transaction_id: first_id,
            reference: journal.reference.clone(),
        })
    }

    fn allocate_payment(&mut self, allocation: &Allocation) -> EngineResult<()> {
        let (invoice_type, payment_types) = match allocation.kind {
            AccountKind::Customer => (
                TransactionType::SI,
                [TransactionType::SR, TransactionType::SC],
            ),
            AccountKind::Supplier => (
                TransactionType::PI,
                [TransactionType::PP, TransactionType::PC],
            ),
        };
        let on_account =
            |record: &TransactionRecord| record.account_ref.as_ref() == Some(&allocation.account);

        let payment_found = self.transactions.iter().any(|record| {
            on_account(record)
                && record.reference == allocation.payment_reference
                && payment_types.iter().any(|kind| kind.tag() == record.kind)
        });
        if !payment_found {
            return Err(EngineError::rejected(format!(
                "Payment {} not found on account {}",
                allocation.payment_reference, allocation.account
            )));
        }

        let invoice = self
            .transactions
            .iter_mut()
            .find(|record| {
                on_account(&**record)
                    && record.reference == allocation.invoice_reference
                    && record.kind == invoice_type.tag()
            })
            .ok_or_else(|| {
                EngineError::rejected(format!(
                    "Invoice {} not found on account {}",
                    allocation.invoice_reference, allocation.account
                ))
            })?;

        if allocation.amount > invoice.outstanding {
            return Err(EngineError::rejected(format!(
                "Allocation of {} exceeds outstanding balance {} on invoice {}",
                allocation.amount, invoice.outstanding, invoice.reference
            )));
        }

        invoice.outstanding -= allocation.amount;
        Ok(())
    }

    fn search_transactions(&mut self, query: &LedgerQuery) -> EngineResult<Vec<TransactionRecord>> {
        Ok(self
            .transactions
            .iter()
            .rev()
            .filter(|record| {
                let kind = TransactionType::from_tag(&record.kind);
                let in_scope = match query.scope {
                    LedgerScope::All => true,
                    LedgerScope::Sales => {
                        kind.and_then(|k| k.account_kind()) == Some(AccountKind::Customer)
                    }
                    LedgerScope::Purchase => {
                        kind.and_then(|k| k.account_kind()) == Some(AccountKind::Supplier)
                    }
                };

                in_scope
                    && query
                        .account
                        .as_ref()
                        .map_or(true, |account| record.account_ref.as_ref() == Some(account))
                    && query.kind.map_or(true, |wanted| kind == Some(wanted))
                    && query.from.map_or(true, |from| record.date >= from)
                    && query.to.map_or(true, |to| record.date <= to)
            })
            .take(query.limit)
            .cloned()
            .collect())
    }

    fn aged_balances(
        &mut self,
        kind: AccountKind,
        as_of: NaiveDate,
    ) -> EngineResult<Vec<AgedBalance>> {
        let invoice_type = match kind {
            AccountKind::Customer => TransactionType::SI,
            AccountKind::Supplier => TransactionType::PI,
        };

        let mut balances = Vec::new();
        for account in self.ledger(kind).values() {
            let mut aged = AgedBalance {
                account_ref: account.account_ref.clone(),
                name: account.name.clone(),
                balance: Decimal::ZERO,
                current: Decimal::ZERO,
                period1: Decimal::ZERO,
                period2: Decimal::ZERO,
                older: Decimal::ZERO,
            };

            let outstanding = self.transactions.iter().filter(|record| {
                record.kind == invoice_type.tag()
                    && record.account_ref.as_ref() == Some(&account.account_ref)
                    && record.outstanding > Decimal::ZERO
                    && record.date <= as_of
            });

            for record in outstanding {
                let bucket = match (as_of - record.date).num_days() {
                    0..=29 => &mut aged.current,
                    30..=59 => &mut aged.period1,
                    60..=89 => &mut aged.period2,
                    _ => &mut aged.older,
                };
                *bucket += record.outstanding;
                aged.balance += record.outstanding;
            }

            if aged.balance > Decimal::ZERO {
                balances.push(aged);
            }
        }

        Ok(balances)
    }

    fn list_products(&mut self, filter: &ListFilter) -> EngineResult<Vec<Product>> {
        Ok(self
            .products
            .values()
            .filter(|product| {
                filter.matches(&[product.code.as_str(), product.description.as_str()])
            })
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn find_product(&mut self, code: &str) -> EngineResult<Option<Product>> {
        Ok(self.products.get(code).cloned())
    }

    fn create_product(&mut self, product: &NewProduct) -> EngineResult<()> {
        if self.products.contains_key(&product.code) {
            return Err(EngineError::rejected(format!(
                "Product {} already exists",
                product.code
            )));
        }
        self.require_nominal(&product.nominal_code)?;
        self.require_tax_code(&product.tax_code)?;

        self.products.insert(
            product.code.clone(),
            Product {
                code: product.code.clone(),
                description: product.description.clone(),
                sales_price: product.sales_price,
                cost_price: product.cost_price,
                quantity_in_stock: Decimal::ZERO,
                nominal_code: product.nominal_code.clone(),
                tax_code: product.tax_code.clone(),
            },
        );
        Ok(())
    }

    fn update_product(&mut self, code: &str, update: &ProductUpdate) -> EngineResult<()> {
        if let Some(nominal) = &update.nominal_code {
            self.require_nominal(nominal)?;
        }
        if let Some(tax_code) = &update.tax_code {
            self.require_tax_code(tax_code)?;
        }

        let product = self
            .products
            .get_mut(code)
            .ok_or_else(|| EngineError::rejected(format!("Product {} does not exist", code)))?;

        if let Some(description) = &update.description {
            product.description = description.clone();
        }
        if let Some(sales_price) = update.sales_price {
            product.sales_price = sales_price;
        }
        if let Some(cost_price) = update.cost_price {
            product.cost_price = cost_price;
        }
        if let Some(nominal) = &update.nominal_code {
            product.nominal_code = nominal.clone();
        }
        if let Some(tax_code) = &update.tax_code {
            product.tax_code = tax_code.clone();
        }
        Ok(())
    }

    fn delete_product(&mut self, code: &str) -> EngineResult<()> {
        self.products
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| EngineError::rejected(format!("Product {} does not exist", code)))
    }

    fn adjust_stock(&mut self, adjustment: &StockAdjustment) -> EngineResult<PostingReceipt> {
        let product = self
            .products
            .get_mut(&adjustment.product_code)
            .ok_or_else(|| {
                EngineError::rejected(format!(
                    "Product {} does not exist",
                    adjustment.product_code
                ))
            })?;

        let new_quantity = product.quantity_in_stock + adjustment.quantity;
        if new_quantity < Decimal::ZERO {
            return Err(EngineError::rejected(format!(
                "Insufficient stock for {}: {} in stock",
                product.code, product.quantity_in_stock
            )));
        }

        product.quantity_in_stock = new_quantity;
        if let Some(cost_price) = adjustment.cost_price {
            product.cost_price = cost_price;
        }

        let kind = if adjustment.quantity >= Decimal::ZERO {
            "AI"
        } else {
            "AO"
        };
        let net_amount = adjustment.quantity.abs() * product.cost_price;
        let nominal_code = product.nominal_code.clone();

        let transaction_id = self.next_transaction_id();
        self.transactions.push(TransactionRecord {
            transaction_id,
            kind: kind.to_string(),
            account_ref: None,
            nominal_code,
            reference: adjustment.reference.clone(),
            details: adjustment.details.clone(),
            date: adjustment.date,
            net_amount,
            tax_amount: Decimal::ZERO,
            outstanding: Decimal::ZERO,
        });

        Ok(PostingReceipt {
            transaction_id,
            reference: adjustment.reference.clone(),
        })
    }

    fn list_orders(&mut self, kind: OrderKind, filter: &ListFilter) -> EngineResult<Vec<Order>> {
        Ok(self
            .order_book(kind)
            .orders
            .values()
            .filter(|order| {
                filter.matches(&[
                    order.account_ref.as_str(),
                    order.reference.as_deref().unwrap_or_default(),
                ])
            })
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn find_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<Option<Order>> {
        Ok(self.order_book(kind).orders.get(&number).cloned())
    }

    fn create_order(&mut self, kind: OrderKind, order: &NewOrder) -> EngineResult<Order> {
        self.require_account(kind.account_kind(), &order.account)?;
        if order.lines.is_empty() {
            return Err(EngineError::rejected("Orders need at least one line"));
        }
        for line in &order.lines {
            if let Some(code) = &line.product_code {
                if !self.products.contains_key(code) {
                    return Err(EngineError::rejected(format!(
                        "Product {} does not exist",
                        code
                    )));
                }
            }
        }

        let book = self.order_book_mut(kind);
        book.last_number += 1;
        let created = Order {
            number: book.last_number,
            account_ref: order.account.clone(),
            reference: order.reference.clone(),
            date: order.date,
            status: OrderStatus::Open,
            net_amount: order_total(&order.lines),
            lines: order.lines.clone(),
        };
        book.orders.insert(created.number, created.clone());
        Ok(created)
    }

    fn update_order(
        &mut self,
        kind: OrderKind,
        number: u32,
        update: &OrderUpdate,
    ) -> EngineResult<()> {
        let order = self.open_order_mut(kind, number)?;

        if let Some(reference) = &update.reference {
            order.reference = Some(reference.clone());
        }
        if let Some(date) = update.date {
            order.date = date;
        }
        if let Some(lines) = &update.lines {
            order.lines = lines.clone();
            order.net_amount = order_total(lines);
        }
        Ok(())
    }

    fn delete_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<()> {
        self.open_order_mut(kind, number)?;
        self.order_book_mut(kind).orders.remove(&number);
        Ok(())
    }

    fn complete_order(&mut self, kind: OrderKind, number: u32) -> EngineResult<PostingReceipt> {
        let order = self.open_order_mut(kind, number)?.clone();
        let invoice_type = kind.invoice_type();
        let prefix = match kind {
            OrderKind::Sales => "SO",
            OrderKind::Purchase => "PO",
        };

        let receipt = self.post_transaction(&Posting {
            kind: invoice_type,
            account: Some(order.account_ref.clone()),
            nominal_code: invoice_type.default_nominal().to_string(),
            bank_nominal: None,
            net_amount: order.net_amount,
            tax_amount: Decimal::ZERO,
            tax_code: invoice_type.default_tax_code().to_string(),
            details: Some(format!("{} {}", kind.title(), number)),
            reference: order
                .reference
                .clone()
                .unwrap_or_else(|| format!("{}{}", prefix, number)),
            date: order.date,
        })?;

        self.open_order_mut(kind, number)?.status = OrderStatus::Completed;
        Ok(receipt)
    }

    fn list_projects(&mut self, filter: &ListFilter) -> EngineResult<Vec<Project>> {
        Ok(self
            .projects
            .iter()
            .filter(|project| filter.matches(&[project.reference.as_str(), project.name.as_str()]))
            .take(filter.limit)
            .cloned()
            .collect())
    }

    fn create_project(&mut self, project: &NewProject) -> EngineResult<()> {
        if self
            .projects
            .iter()
            .any(|existing| existing.reference == project.reference)
        {
            return Err(EngineError::rejected(format!(
                "Project {} already exists",
                project.reference
            )));
        }
        if let Some(customer) = &project.customer {
            self.require_account(AccountKind::Customer, customer)?;
        }

        self.projects.push(Project {
            reference: project.reference.clone(),
            name: project.name.clone(),
            customer_ref: project.customer.clone(),
            status: "Active".to_string(),
            start_date: project.start_date,
        });
        Ok(())
    }

    fn project_cost_codes(&mut self) -> EngineResult<Vec<ReferenceItem>> {
        Ok(vec![
            ReferenceItem::new("LAB", "Labour"),
            ReferenceItem::new("MAT", "Materials"),
            ReferenceItem::new("SUB", "Subcontractors"),
            ReferenceItem::new("EXP", "Expenses"),
        ])
    }
}

fn tax_codes() -> Vec<ReferenceItem> {
    vec![
        ReferenceItem::new("T0", "Zero rated").with_rate(Decimal::ZERO),
        ReferenceItem::new("T1", "Standard rate").with_rate(Decimal::from(20)),
        ReferenceItem::new("T2", "Exempt").with_rate(Decimal::ZERO),
        ReferenceItem::new("T9", "Outside the scope of VAT").with_rate(Decimal::ZERO),
    ]
}

fn to_ledger_account(account: &NewAccount) -> LedgerAccount {
    LedgerAccount {
        account_ref: account.account_ref.clone(),
        name: account.name.clone(),
        balance: Decimal::ZERO,
        credit_limit: account.credit_limit,
        address: account.address.clone(),
        contact_name: account.contact_name.clone(),
        telephone: account.telephone.clone(),
        email: account.email.clone(),
    }
}

fn order_total(lines: &[OrderLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.quantity * line.unit_price)
        .sum()
}

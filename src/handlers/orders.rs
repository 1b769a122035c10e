//! Sales & Purchase Order Handlers
//!
//! Order lifecycle: create (with account provisioning), read, amend, delete
//! and complete. Completing an order posts the matching invoice; a completed
//! order can no longer be changed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{
    account_ref, date_or_today, non_negative_amount, optional_bounded, tax_code_or,
    MAX_DETAILS_LEN, MAX_PRODUCT_CODE_LEN, MAX_REFERENCE_LEN,
};
use crate::api::{Reply, RequestContext};
use crate::domain::transaction::STANDARD_TAX_CODE;
use crate::domain::AccountKind;
use crate::engine::{
    AccountingEngine, ListFilter, NewOrder, Order, OrderKind, OrderLine, OrderStatus,
    OrderUpdate,
};
use crate::error::{AppError, AppResult};
use crate::provisioning::{ensure_account, Provisioned};

const DEFAULT_LIST_LIMIT: usize = 50;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub product_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub tax_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_account: Option<String>,
    pub supplier_account: Option<String>,
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub lines: Vec<OrderLineRequest>,
    #[serde(default)]
    pub auto_create_customer: bool,
    #[serde(default)]
    pub auto_create_supplier: bool,
}

impl CreateOrderRequest {
    fn account_for(&self, kind: AccountKind) -> (&'static str, Option<&str>, bool) {
        match kind {
            AccountKind::Customer => (
                "customerAccount",
                self.customer_account.as_deref(),
                self.auto_create_customer,
            ),
            AccountKind::Supplier => (
                "supplierAccount",
                self.supplier_account.as_deref(),
                self.auto_create_supplier,
            ),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub reference: Option<String>,
    pub date: Option<NaiveDate>,
    pub lines: Option<Vec<OrderLineRequest>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub account_created: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrderResponse {
    pub number: u32,
    pub status: OrderStatus,
    pub transaction_id: u64,
    pub invoice_reference: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedOrderResponse {
    pub number: u32,
    pub deleted: bool,
}

// =========================================================================
// Validation
// =========================================================================

/// A line as validated, before product defaults are applied
struct LineDraft {
    product_code: Option<String>,
    description: Option<String>,
    quantity: Decimal,
    unit_price: Option<Decimal>,
    tax_code: String,
}

fn validate_lines(lines: Vec<OrderLineRequest>) -> AppResult<Vec<LineDraft>> {
    if lines.is_empty() {
        return Err(AppError::validation("Orders need at least one line"));
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let field = |name: &str| format!("lines[{}].{}", index, name);

            let quantity = line
                .quantity
                .ok_or_else(|| AppError::validation(format!("{} is required", field("quantity"))))?;
            if quantity <= Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "{} must be greater than zero",
                    field("quantity")
                )));
            }

            let product_code =
                optional_bounded(&field("productCode"), line.product_code, MAX_PRODUCT_CODE_LEN)?;
            let description =
                optional_bounded(&field("description"), line.description, MAX_DETAILS_LEN)?;
            if product_code.is_none() && description.is_none() {
                return Err(AppError::validation(format!(
                    "{} is required when no productCode is given",
                    field("description")
                )));
            }

            let unit_price = line
                .unit_price
                .map(|price| non_negative_amount(&field("unitPrice"), Some(price)))
                .transpose()?;

            Ok(LineDraft {
                product_code,
                description,
                quantity,
                unit_price,
                tax_code: tax_code_or(line.tax_code, STANDARD_TAX_CODE),
            })
        })
        .collect()
}

/// Fill missing descriptions and prices from the product catalogue
fn resolve_lines(
    engine: &mut dyn AccountingEngine,
    kind: OrderKind,
    drafts: Vec<LineDraft>,
) -> AppResult<Vec<OrderLine>> {
    drafts
        .into_iter()
        .map(|draft| {
            let product = match &draft.product_code {
                Some(code) => Some(engine.find_product(code)?.ok_or_else(|| {
                    AppError::validation(format!("Product {} not found", code))
                })?),
                None => None,
            };

            let catalogue_price = product.as_ref().map(|product| match kind {
                OrderKind::Sales => product.sales_price,
                OrderKind::Purchase => product.cost_price,
            });

            Ok(OrderLine {
                description: draft
                    .description
                    .or_else(|| product.as_ref().map(|product| product.description.clone()))
                    .unwrap_or_default(),
                product_code: draft.product_code,
                quantity: draft.quantity,
                unit_price: draft
                    .unit_price
                    .or(catalogue_price)
                    .unwrap_or(Decimal::ZERO),
                tax_code: draft.tax_code,
            })
        })
        .collect()
}

fn order_number(ctx: &RequestContext<'_>) -> AppResult<u32> {
    ctx.param("number")?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or_else(|| AppError::validation("Order number must be a positive integer"))
}

/// Load an order that may still be changed
fn open_order(engine: &mut dyn AccountingEngine, kind: OrderKind, number: u32) -> AppResult<Order> {
    let order = engine
        .find_order(kind, number)?
        .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind.title(), number)))?;

    if order.status == OrderStatus::Completed {
        return Err(AppError::validation(format!(
            "{} {} is already completed",
            kind.title(),
            number
        )));
    }
    Ok(order)
}

// =========================================================================
// Handlers
// =========================================================================

fn list(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let orders = ctx.engine().call(|engine| engine.list_orders(kind, &filter))?;
    Reply::ok(&orders)
}

fn create(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let req: CreateOrderRequest = ctx.body()?;
    let ledger = kind.account_kind();

    let (field, raw_account, auto_create) = req.account_for(ledger);
    let account = account_ref(field, raw_account)?;
    let reference = optional_bounded("reference", req.reference, MAX_REFERENCE_LEN)?;
    let date = date_or_today(req.date);
    let drafts = validate_lines(req.lines)?;

    let (order, provisioned) = ctx.engine().call(|engine| -> AppResult<_> {
        let lines = resolve_lines(engine, kind, drafts)?;
        let provisioned = ensure_account(engine, ledger, &account, auto_create)?;
        let order = engine.create_order(
            kind,
            &NewOrder {
                account: account.clone(),
                reference,
                date,
                lines,
            },
        )?;
        Ok((order, provisioned))
    })?;

    tracing::info!(
        kind = kind.title(),
        number = order.number,
        account_ref = %order.account_ref,
        "Order created"
    );

    Reply::created(&CreatedOrderResponse {
        order,
        account_created: provisioned == Provisioned::Created,
    })
}

fn get(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let number = order_number(ctx)?;
    let order = ctx
        .engine()
        .call(|engine| engine.find_order(kind, number))?
        .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind.title(), number)))?;
    Reply::ok(&order)
}

fn update(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let number = order_number(ctx)?;
    let req: UpdateOrderRequest = ctx.optional_body()?.unwrap_or_default();

    let reference = optional_bounded("reference", req.reference, MAX_REFERENCE_LEN)?;
    let drafts = req.lines.map(validate_lines).transpose()?;

    let updated = ctx.engine().call(|engine| -> AppResult<Order> {
        open_order(engine, kind, number)?;
        let lines = drafts
            .map(|drafts| resolve_lines(engine, kind, drafts))
            .transpose()?;

        engine.update_order(
            kind,
            number,
            &OrderUpdate {
                reference,
                date: req.date,
                lines,
            },
        )?;
        engine
            .find_order(kind, number)?
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", kind.title(), number)))
    })?;

    Reply::ok(&updated)
}

fn delete(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let number = order_number(ctx)?;

    ctx.engine().call(|engine| -> AppResult<()> {
        open_order(engine, kind, number)?;
        Ok(engine.delete_order(kind, number)?)
    })?;

    tracing::info!(kind = kind.title(), number, "Order deleted");
    Reply::ok(&DeletedOrderResponse {
        number,
        deleted: true,
    })
}

fn complete(ctx: &RequestContext<'_>, kind: OrderKind) -> AppResult<Reply> {
    let number = order_number(ctx)?;

    let receipt = ctx.engine().call(|engine| -> AppResult<_> {
        open_order(engine, kind, number)?;
        Ok(engine.complete_order(kind, number)?)
    })?;

    tracing::info!(
        kind = kind.title(),
        number,
        reference = %receipt.reference,
        "Order completed"
    );

    Reply::ok(&CompletedOrderResponse {
        number,
        status: OrderStatus::Completed,
        transaction_id: receipt.transaction_id,
        invoice_reference: receipt.reference,
    })
}

/// GET /api/salesorders
pub fn list_sales_orders(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    list(ctx, OrderKind::Sales)
}

/// POST /api/salesorders
pub fn create_sales_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    create(ctx, OrderKind::Sales)
}

/// GET /api/salesorders/{number}
pub fn get_sales_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    get(ctx, OrderKind::Sales)
}

/// PATCH /api/salesorders/{number}
pub fn update_sales_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    update(ctx, OrderKind::Sales)
}

/// DELETE /api/salesorders/{number}
pub fn delete_sales_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    delete(ctx, OrderKind::Sales)
}

/// POST /api/salesorders/{number}/complete
pub fn complete_sales_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    complete(ctx, OrderKind::Sales)
}

/// GET /api/purchaseorders
pub fn list_purchase_orders(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    list(ctx, OrderKind::Purchase)
}

/// POST /api/purchaseorders
pub fn create_purchase_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    create(ctx, OrderKind::Purchase)
}

/// GET /api/purchaseorders/{number}
pub fn get_purchase_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    get(ctx, OrderKind::Purchase)
}

/// PATCH /api/purchaseorders/{number}
pub fn update_purchase_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    update(ctx, OrderKind::Purchase)
}

/// DELETE /api/purchaseorders/{number}
pub fn delete_purchase_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    delete(ctx, OrderKind::Purchase)
}

/// POST /api/purchaseorders/{number}/complete
pub fn complete_purchase_order(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    complete(ctx, OrderKind::Purchase)
}

//! Product & Stock Handlers

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::request::{
    date_or_today, non_negative_amount, optional_bounded, optional_string, required_bounded,
    MAX_DETAILS_LEN, MAX_NOMINAL_CODE_LEN, MAX_PRODUCT_CODE_LEN, MAX_REFERENCE_LEN,
};
use crate::api::{Reply, RequestContext};
use crate::domain::transaction::{SALES_NOMINAL, STANDARD_TAX_CODE, STOCK_ADJUSTMENT_PREFIX};
use crate::engine::{ListFilter, NewProduct, Product, ProductUpdate, StockAdjustment};
use crate::error::{AppError, AppResult};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 60;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub code: Option<String>,
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub description: Option<String>,
    pub sales_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub nominal_code: Option<String>,
    pub tax_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentRequest {
    pub product_code: Option<String>,
    pub quantity: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub reference: Option<String>,
    pub details: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub code: String,
    pub description: String,
    pub quantity_in_stock: Decimal,
    pub cost_price: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentResponse {
    pub transaction_id: u64,
    pub reference: String,
    pub product_code: String,
    pub quantity: Decimal,
    pub quantity_in_stock: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub code: String,
    pub deleted: bool,
}

fn product_not_found(code: &str) -> AppError {
    AppError::not_found(format!("Product {} not found", code))
}

fn path_code(ctx: &RequestContext<'_>) -> AppResult<String> {
    required_bounded(
        "code",
        Some(ctx.param("code")?.to_string()),
        MAX_PRODUCT_CODE_LEN,
    )
}

fn optional_price(field: &str, value: Option<Decimal>) -> AppResult<Option<Decimal>> {
    value
        .map(|price| non_negative_amount(field, Some(price)))
        .transpose()
}

// =========================================================================
// Products
// =========================================================================

/// GET /api/products
pub fn list_products(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let products = ctx.engine().call(|engine| engine.list_products(&filter))?;
    Reply::ok(&products)
}

/// POST /api/products
pub fn create_product(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: CreateProductRequest = ctx.body()?;
    let tax_code = optional_string(req.tax_code)
        .map(|code| code.to_uppercase())
        .unwrap_or_else(|| STANDARD_TAX_CODE.to_string());

    let product = NewProduct {
        code: required_bounded("code", req.code, MAX_PRODUCT_CODE_LEN)?,
        description: required_bounded("description", req.description, MAX_DESCRIPTION_LEN)?,
        sales_price: non_negative_amount("salesPrice", req.sales_price)?,
        cost_price: non_negative_amount("costPrice", req.cost_price)?,
        nominal_code: optional_bounded("nominalCode", req.nominal_code, MAX_NOMINAL_CODE_LEN)?
            .unwrap_or_else(|| SALES_NOMINAL.to_string()),
        tax_code,
    };

    let created = ctx.engine().call(|engine| -> AppResult<Product> {
        if engine.find_product(&product.code)?.is_some() {
            return Err(AppError::validation(format!(
                "Product {} already exists",
                product.code
            )));
        }
        engine.create_product(&product)?;
        engine
            .find_product(&product.code)?
            .ok_or_else(|| product_not_found(&product.code))
    })?;

    tracing::info!(code = %created.code, "Product created");
    Reply::created(&created)
}

/// GET /api/products/{code}
pub fn get_product(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let code = path_code(ctx)?;
    let product = ctx
        .engine()
        .call(|engine| engine.find_product(&code))?
        .ok_or_else(|| product_not_found(&code))?;
    Reply::ok(&product)
}

/// PATCH /api/products/{code}
pub fn update_product(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let code = path_code(ctx)?;
    let req: UpdateProductRequest = ctx.optional_body()?.unwrap_or_default();

    let update = ProductUpdate {
        description: optional_bounded("description", req.description, MAX_DESCRIPTION_LEN)?,
        sales_price: optional_price("salesPrice", req.sales_price)?,
        cost_price: optional_price("costPrice", req.cost_price)?,
        nominal_code: optional_bounded("nominalCode", req.nominal_code, MAX_NOMINAL_CODE_LEN)?,
        tax_code: optional_string(req.tax_code).map(|code| code.to_uppercase()),
    };

    let updated = ctx.engine().call(|engine| -> AppResult<Product> {
        if engine.find_product(&code)?.is_none() {
            return Err(product_not_found(&code));
        }
        engine.update_product(&code, &update)?;
        engine
            .find_product(&code)?
            .ok_or_else(|| product_not_found(&code))
    })?;

    Reply::ok(&updated)
}

/// DELETE /api/products/{code}
pub fn delete_product(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let code = path_code(ctx)?;

    ctx.engine().call(|engine| -> AppResult<()> {
        if engine.find_product(&code)?.is_none() {
            return Err(product_not_found(&code));
        }
        Ok(engine.delete_product(&code)?)
    })?;

    tracing::info!(code = %code, "Product deleted");
    Reply::ok(&DeletedResponse { code, deleted: true })
}

// =========================================================================
// Stock
// =========================================================================

/// GET /api/stock
pub fn list_stock(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let levels: Vec<StockLevel> = ctx
        .engine()
        .call(|engine| engine.list_products(&filter))?
        .into_iter()
        .map(|product| StockLevel {
            code: product.code,
            description: product.description,
            quantity_in_stock: product.quantity_in_stock,
            cost_price: product.cost_price,
        })
        .collect();
    Reply::ok(&levels)
}

/// POST /api/stock
pub fn adjust_stock(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: StockAdjustmentRequest = ctx.body()?;

    let product_code = required_bounded("productCode", req.product_code, MAX_PRODUCT_CODE_LEN)?;
    let quantity = req
        .quantity
        .ok_or_else(|| AppError::validation("quantity is required"))?;
    if quantity.is_zero() {
        return Err(AppError::validation("quantity must not be zero"));
    }
    let reference = optional_bounded("reference", req.reference, MAX_REFERENCE_LEN)?;

    let adjustment = StockAdjustment {
        product_code,
        quantity,
        cost_price: optional_price("costPrice", req.cost_price)?,
        reference: ctx.reference(reference, STOCK_ADJUSTMENT_PREFIX),
        details: optional_bounded("details", req.details, MAX_DETAILS_LEN)?,
        date: date_or_today(req.date),
    };

    let (receipt, product) = ctx.engine().call(|engine| -> AppResult<_> {
        let current = engine
            .find_product(&adjustment.product_code)?
            .ok_or_else(|| product_not_found(&adjustment.product_code))?;
        if current.quantity_in_stock + adjustment.quantity < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Insufficient stock for {}: {} in stock",
                current.code, current.quantity_in_stock
            )));
        }
        let receipt = engine.adjust_stock(&adjustment)?;
        let product = engine
            .find_product(&adjustment.product_code)?
            .ok_or_else(|| product_not_found(&adjustment.product_code))?;
        Ok((receipt, product))
    })?;

    tracing::info!(
        product_code = %product.code,
        quantity = %adjustment.quantity,
        reference = %receipt.reference,
        "Stock adjusted"
    );

    Reply::created(&StockAdjustmentResponse {
        transaction_id: receipt.transaction_id,
        reference: receipt.reference,
        product_code: product.code,
        quantity: adjustment.quantity,
        quantity_in_stock: product.quantity_in_stock,
    })
}

//! Batch transaction handler

use serde::Deserialize;
use serde_json::Value;

use crate::api::{Reply, RequestContext};
use crate::batch::BatchProcessor;
use crate::error::{AppError, AppResult};

/// Items stay as raw JSON so one malformed item cannot reject the batch
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub transactions: Option<Vec<Value>>,
}

/// POST /api/transactions/batch
///
/// Always 200 once processing starts; failures are reported per item.
pub fn post_batch(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: Option<BatchRequest> = ctx.optional_body()?;
    let items = req
        .and_then(|req| req.transactions)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| AppError::validation("transactions must contain at least one item"))?;

    let result = BatchProcessor::new(ctx.engine(), ctx.references()).process(items);
    Reply::ok(&result)
}

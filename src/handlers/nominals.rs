//! Nominal ledger handlers

use serde::{Deserialize, Serialize};

use crate::api::request::{required_bounded, MAX_NOMINAL_CODE_LEN};
use crate::api::{Reply, RequestContext};
use crate::engine::{ListFilter, NewNominal, NominalAccount};
use crate::error::{AppError, AppResult};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_NAME_LEN: usize = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNominalRequest {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NominalExistsResponse {
    pub code: String,
    pub exists: bool,
}

/// GET /api/nominals
pub fn list_nominals(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let nominals = ctx.engine().call(|engine| engine.list_nominals(&filter))?;
    Reply::ok(&nominals)
}

/// POST /api/nominals
pub fn create_nominal(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: CreateNominalRequest = ctx.body()?;
    let nominal = NewNominal {
        code: required_bounded("code", req.code, MAX_NOMINAL_CODE_LEN)?,
        name: required_bounded("name", req.name, MAX_NAME_LEN)?,
    };

    ctx.engine().call(|engine| -> AppResult<()> {
        if engine.nominal_exists(&nominal.code)? {
            return Err(AppError::validation(format!(
                "Nominal code {} already exists",
                nominal.code
            )));
        }
        Ok(engine.create_nominal(&nominal)?)
    })?;

    tracing::info!(code = %nominal.code, "Nominal code created");
    Reply::created(&NominalAccount {
        code: nominal.code,
        name: nominal.name,
        balance: Default::default(),
    })
}

/// GET /api/nominals/{code}/exists
pub fn nominal_exists(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let code = ctx.param("code")?.trim().to_string();
    let exists = ctx.engine().call(|engine| engine.nominal_exists(&code))?;
    Reply::ok(&NominalExistsResponse { code, exists })
}

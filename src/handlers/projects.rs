//! Project tracking handlers

use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::request::{optional_account_ref, required_bounded, MAX_REFERENCE_LEN};
use crate::api::{Reply, RequestContext};
use crate::domain::AccountKind;
use crate::engine::{AccountingEngine, ListFilter, NewProject, Project};
use crate::error::{AppError, AppResult};
use crate::provisioning::require_account;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_NAME_LEN: usize = 60;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub reference: Option<String>,
    pub name: Option<String>,
    pub customer_account: Option<String>,
    pub start_date: Option<NaiveDate>,
}

fn find_project(engine: &mut dyn AccountingEngine, reference: &str) -> AppResult<Option<Project>> {
    let filter = ListFilter::new(Some(reference.to_string()), usize::MAX);
    Ok(engine
        .list_projects(&filter)?
        .into_iter()
        .find(|project| project.reference.eq_ignore_ascii_case(reference)))
}

/// GET /api/projects and GET /api/search/projects
pub fn list_projects(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let filter = ListFilter::new(ctx.query.search(), ctx.query.limit(DEFAULT_LIST_LIMIT));
    let projects = ctx.engine().call(|engine| engine.list_projects(&filter))?;
    Reply::ok(&projects)
}

/// POST /api/projects
pub fn create_project(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let req: CreateProjectRequest = ctx.body()?;
    let project = NewProject {
        reference: required_bounded("reference", req.reference, MAX_REFERENCE_LEN)?,
        name: required_bounded("name", req.name, MAX_NAME_LEN)?,
        customer: optional_account_ref("customerAccount", req.customer_account.as_deref())?,
        start_date: req.start_date,
    };

    let created = ctx.engine().call(|engine| -> AppResult<Project> {
        if find_project(engine, &project.reference)?.is_some() {
            return Err(AppError::validation(format!(
                "Project {} already exists",
                project.reference
            )));
        }
        if let Some(customer) = &project.customer {
            require_account(engine, AccountKind::Customer, customer)?;
        }
        engine.create_project(&project)?;
        find_project(engine, &project.reference)?.ok_or_else(|| {
            AppError::Internal(format!("Project {} was not saved", project.reference))
        })
    })?;

    tracing::info!(reference = %created.reference, "Project created");
    Reply::created(&created)
}

/// GET /api/projectcostcodes
pub fn project_cost_codes(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    let codes = ctx.engine().call(|engine| engine.project_cost_codes())?;
    Reply::ok(&codes)
}

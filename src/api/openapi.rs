//! OpenAPI document
//!
//! Built from the live route table, so it lists exactly what the dispatcher
//! serves. Schemas are not described; each operation documents its path
//! parameters and the envelope responses.

use serde_json::{json, Map, Value};

use crate::handlers::company::GATEWAY_VERSION;
use crate::error::AppResult;

use super::context::{Reply, RequestContext};
use super::router::RouteTable;

pub const API_TITLE: &str = "Ledger Gateway API";

/// Generate the document for `routes`
pub fn document(routes: &RouteTable) -> Value {
    let mut paths = Map::new();

    for route in routes.iter() {
        let parameters: Vec<Value> = route
            .pattern
            .capture_names()
            .map(|name| {
                json!({
                    "name": name,
                    "in": "path",
                    "required": true,
                    "schema": { "type": "string" }
                })
            })
            .collect();

        let operation = json!({
            "summary": route.summary,
            "parameters": parameters,
            "responses": {
                "200": { "description": "Success envelope" },
                "400": { "description": "Validation failure" },
                "404": { "description": "Not found" },
                "500": { "description": "Engine or internal failure" }
            }
        });

        let entry = paths
            .entry(route.pattern.as_str().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(methods) = entry {
            methods.insert(route.method.as_str().to_lowercase(), operation);
        }
    }

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": API_TITLE,
            "version": GATEWAY_VERSION
        },
        "paths": paths
    })
}

/// GET /api/swagger.json
pub fn swagger(ctx: &RequestContext<'_>) -> AppResult<Reply> {
    Ok(Reply::raw(document(ctx.routes)))
}

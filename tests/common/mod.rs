//! Common test utilities

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use ledger_gateway::api;
use ledger_gateway::domain::{AccountKind, AccountRef};
use ledger_gateway::engine::{EngineHandle, InMemoryEngine, NewProduct, SandboxControls};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::util::ServiceExt;

pub struct TestGateway {
    pub app: Router,
    pub controls: Arc<SandboxControls>,
}

/// Sandbox with customer ACME01, supplier BOLT01 and product WIDGET
pub fn seeded_engine() -> InMemoryEngine {
    InMemoryEngine::sandbox()
        .with_account(
            AccountKind::Customer,
            AccountRef::parse("ACME01").unwrap(),
            "Acme Trading",
        )
        .with_account(
            AccountKind::Supplier,
            AccountRef::parse("BOLT01").unwrap(),
            "Bolt Supplies",
        )
        .with_product(
            NewProduct {
                code: "WIDGET".to_string(),
                description: "Blue widget".to_string(),
                sales_price: dec!(12.50),
                cost_price: dec!(7.25),
                nominal_code: "4000".to_string(),
                tax_code: "T1".to_string(),
            },
            dec!(100),
        )
}

pub fn gateway_with(engine: InMemoryEngine) -> TestGateway {
    let controls = engine.controls();
    let dispatcher = api::create_dispatcher(EngineHandle::new(engine));
    TestGateway {
        app: api::create_router(dispatcher, Duration::from_secs(5)),
        controls,
    }
}

pub fn gateway() -> TestGateway {
    gateway_with(seeded_engine())
}

/// Send a request and decode the JSON body (`Value::Null` when empty)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let body = match body {
        Some(json) => Body::from(serde_json::to_vec(&json).unwrap()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();

    send_request(app, req).await
}

pub async fn send_request(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

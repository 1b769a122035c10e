//! API Integration Tests
//!
//! Drive the full axum router over the in-memory sandbox engine.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use ledger_gateway::domain::{AccountKind, AccountRef};
use ledger_gateway::engine::InMemoryEngine;
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

mod common;

use common::{gateway, gateway_with, send, send_request};

fn message(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_options_preflight_is_empty_204_with_cors() {
    let gw = gateway();
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/anything/at/all")
        .body(Body::empty())
        .unwrap();

    let response = gw.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert!(response.headers().contains_key("access-control-allow-methods"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_every_response_carries_cors() {
    let gw = gateway();

    let (status, headers, _) = send(&gw.app, "GET", "/api/company", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");

    let (status, headers, _) = send(&gw.app, "GET", "/api/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_unknown_route_is_404_envelope() {
    let gw = gateway();
    let (status, _, body) = send(&gw.app, "GET", "/api/nowhere", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(message(&body), "Endpoint not found: GET /api/nowhere");
}

#[tokio::test]
async fn test_overlong_account_ref_is_rejected() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/customers",
        Some(json!({ "accountRef": "TOOLONGREF", "name": "Too Long" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "accountRef must be 8 characters or fewer");
}

#[tokio::test]
async fn test_account_refs_are_normalized() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/customers",
        Some(json!({ "accountRef": " abc123 ", "name": "Abc Ltd" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accountRef"], "ABC123");

    let (status, _, body) = send(&gw.app, "GET", "/api/customers/abc123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Abc Ltd");

    let (status, _, body) = send(&gw.app, "GET", "/api/customers/ABC123/exists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["exists"], true);

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/customers",
        Some(json!({ "accountRef": "ABC123", "name": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Customer account ABC123 already exists");
}

#[tokio::test]
async fn test_invoice_for_missing_customer_without_auto_create() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/sales/invoice",
        Some(json!({
            "customerAccount": "NOPE",
            "netAmount": 100,
            "autoCreateCustomer": false
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(message(&body).contains("NOPE"));
    assert!(message(&body).contains("autoCreateCustomer"));
    assert_eq!(gw.controls.account_creates(), 0);
    assert_eq!(gw.controls.postings(), 0);
}

#[tokio::test]
async fn test_invoice_auto_creates_missing_customer() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/sales/invoice",
        Some(json!({
            "customerAccount": "newco",
            "netAmount": "250.00",
            "taxAmount": "50.00",
            "reference": "INV-1001",
            "autoCreateCustomer": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accountCreated"], true);
    assert_eq!(body["data"]["accountRef"], "NEWCO");
    assert_eq!(body["data"]["reference"], "INV-1001");
    assert_eq!(body["data"]["type"], "SI");
    assert_eq!(gw.controls.account_creates(), 1);
    assert_eq!(gw.controls.postings(), 1);

    let (status, _, body) = send(&gw.app, "GET", "/api/customers/NEWCO/exists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["exists"], true);
}

#[tokio::test]
async fn test_failed_auto_create_blocks_the_posting() {
    let gw = gateway();
    gw.controls.set_reject_account_creates(true);

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/purchases/invoice",
        Some(json!({
            "supplierAccount": "GHOST",
            "netAmount": 10,
            "autoCreateSupplier": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("GHOST"));
    assert_eq!(gw.controls.account_creates(), 1);
    assert_eq!(gw.controls.postings(), 0);
}

#[tokio::test]
async fn test_receipt_never_creates_the_account() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/sales/receipt",
        Some(json!({
            "customerAccount": "NOPE",
            "netAmount": 10,
            "autoCreateCustomer": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Customer account NOPE not found");
    assert_eq!(gw.controls.account_creates(), 0);
}

#[tokio::test]
async fn test_bank_payment_uses_defaults() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/bank/payment",
        Some(json!({ "netAmount": 42.5, "details": "Stationery" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["type"], "BP");
    assert!(body["data"]["reference"].as_str().unwrap().starts_with("BP-"));
    assert!(body["data"]["accountRef"].is_null());
}

#[tokio::test]
async fn test_batch_isolates_failing_items() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/transactions/batch",
        Some(json!({
            "transactions": [
                { "type": "SI", "accountReference": "ACME01", "netAmount": 100, "reference": "B-1" },
                { "type": "XX", "accountReference": "ACME01", "netAmount": 5, "reference": "B-2" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["successCount"], 1);
    assert_eq!(data["failCount"], 1);
    assert_eq!(data["results"][0]["success"], true);
    assert_eq!(data["results"][0]["reference"], "B-1");
    assert_eq!(data["results"][1]["success"], false);
    assert_eq!(data["results"][1]["reference"], "B-2");
    assert_eq!(data["results"][1]["message"], "Unknown transaction type: XX");
}

#[tokio::test]
async fn test_batch_with_every_item_failing_is_still_200() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/transactions/batch",
        Some(json!({
            "transactions": [
                { "type": "SI", "accountReference": "NOPE", "netAmount": 1 },
                "not an object",
                { "type": "BR", "netAmount": -3 }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["successCount"], 0);
    assert_eq!(body["data"]["failCount"], 3);
    assert_eq!(body["data"]["results"][1]["message"], "Invalid transaction data");
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/transactions/batch",
        Some(json!({ "transactions": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "transactions must contain at least one item");
}

#[tokio::test]
async fn test_non_positive_limit_falls_back_to_default() {
    let engine = (0..55).fold(InMemoryEngine::sandbox(), |engine, n| {
        engine.with_account(
            AccountKind::Customer,
            AccountRef::parse(&format!("C{:03}", n)).unwrap(),
            "Bulk Customer",
        )
    });
    let gw = gateway_with(engine);

    let (status, _, body) = send(&gw.app, "GET", "/api/customers?limit=-5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 50);

    let (_, _, body) = send(&gw.app, "GET", "/api/customers?limit=3", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_malformed_json_is_invalid_body() {
    let gw = gateway();
    let req = Request::builder()
        .method("POST")
        .uri("/api/customers")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, _, body) = send_request(&gw.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Invalid request body");
}

#[tokio::test]
async fn test_swagger_is_served_raw() {
    let gw = gateway();
    let (status, _, body) = send(&gw.app, "GET", "/api/swagger.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("success").is_none());
    assert_eq!(body["openapi"], "3.0.3");
    assert!(body["paths"]["/api/transactions/batch"]["post"].is_object());
}

#[tokio::test]
async fn test_sales_order_lifecycle() {
    let gw = gateway();

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/salesorders",
        Some(json!({
            "customerAccount": "ACME01",
            "lines": [{ "productCode": "WIDGET", "quantity": 4 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accountCreated"], false);
    assert_eq!(body["data"]["lines"][0]["description"], "Blue widget");
    let number = body["data"]["number"].as_u64().unwrap();

    let uri = format!("/api/salesorders/{}", number);
    let (status, _, body) = send(&gw.app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "open");

    let (status, _, body) = send(&gw.app, "POST", &format!("{}/complete", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(gw.controls.postings(), 1);

    let (status, _, body) = send(&gw.app, "POST", &format!("{}/complete", uri), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("already completed"));

    let (status, _, _) = send(&gw.app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_number_must_be_numeric() {
    let gw = gateway();
    let (status, _, body) = send(&gw.app, "GET", "/api/purchaseorders/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Order number must be a positive integer");
}

#[tokio::test]
async fn test_correlation_id_is_echoed() {
    let gw = gateway();
    let id = Uuid::new_v4().to_string();
    let req = Request::builder()
        .method("GET")
        .uri("/api/status")
        .header("x-correlation-id", id.as_str())
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send_request(&gw.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-correlation-id"], id.as_str());

    let (_, headers, _) = send(&gw.app, "GET", "/api/status", None).await;
    let generated = headers["x-correlation-id"].to_str().unwrap();
    assert!(Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_order_with_unknown_product_creates_no_account() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/salesorders",
        Some(json!({
            "customerAccount": "NEWCUST",
            "autoCreateCustomer": true,
            "lines": [{ "productCode": "NOSUCH", "quantity": 1 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Product NOSUCH not found");
    assert_eq!(gw.controls.account_creates(), 0);

    let (_, _, body) = send(&gw.app, "GET", "/api/customers/NEWCUST/exists", None).await;
    assert_eq!(body["data"]["exists"], false);
}

#[tokio::test]
async fn test_order_auto_creates_supplier_with_known_product() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/purchaseorders",
        Some(json!({
            "supplierAccount": "NEWSUP",
            "autoCreateSupplier": true,
            "lines": [{ "productCode": "WIDGET", "quantity": 2 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["accountCreated"], true);
    assert_eq!(body["data"]["lines"][0]["unitPrice"], "7.25");
    assert_eq!(gw.controls.account_creates(), 1);
}

#[tokio::test]
async fn test_exists_reports_reference_and_flag() {
    let gw = gateway();

    let (status, _, body) = send(&gw.app, "GET", "/api/suppliers/bolt01/exists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "accountRef": "BOLT01", "exists": true }));

    let (status, _, body) = send(&gw.app, "GET", "/api/customers/NOPE/exists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "accountRef": "NOPE", "exists": false }));

    let (status, _, body) = send(&gw.app, "GET", "/api/customers/NOPE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Customer account NOPE not found");
}

#[tokio::test]
async fn test_duplicate_supplier_is_rejected() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/suppliers",
        Some(json!({ "accountRef": "BOLT01", "name": "Bolt Again" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Supplier account BOLT01 already exists");
    assert_eq!(gw.controls.account_creates(), 0);
}

#[tokio::test]
async fn test_nominal_create_exists_and_duplicate() {
    let gw = gateway();

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/nominals",
        Some(json!({ "code": "4010", "name": "Sales Type B" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "4010");

    let (status, _, body) = send(&gw.app, "GET", "/api/nominals/4010/exists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "code": "4010", "exists": true }));

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/nominals",
        Some(json!({ "code": "4000", "name": "Sales Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Nominal code 4000 already exists");
}

#[tokio::test]
async fn test_stock_adjustment_checks_available_quantity() {
    let gw = gateway();

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/stock",
        Some(json!({ "productCode": "WIDGET", "quantity": -150 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Insufficient stock for WIDGET: 100 in stock");

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/stock",
        Some(json!({ "productCode": "WIDGET", "quantity": -30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["reference"].as_str().unwrap().starts_with("ADJ-"));

    let (_, _, body) = send(&gw.app, "GET", "/api/products/WIDGET", None).await;
    assert_eq!(body["data"]["quantityInStock"], "70");
}

#[tokio::test]
async fn test_missing_product_update_and_delete_are_404() {
    let gw = gateway();

    let (status, _, body) = send(
        &gw.app,
        "PATCH",
        "/api/products/NOSUCH",
        Some(json!({ "description": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Product NOSUCH not found");

    let (status, _, body) = send(&gw.app, "DELETE", "/api/products/NOSUCH", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Product NOSUCH not found");

    let (status, _, body) = send(
        &gw.app,
        "PATCH",
        "/api/products/WIDGET",
        Some(json!({ "description": "Red widget" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Red widget");
}

#[tokio::test]
async fn test_ledger_search_filters_by_type_and_account() {
    let gw = gateway();
    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/transactions/batch",
        Some(json!({
            "transactions": [
                { "type": "SI", "accountReference": "ACME01", "netAmount": 100, "reference": "S-1" },
                { "type": "SR", "accountReference": "ACME01", "netAmount": 40, "reference": "R-1" },
                { "type": "PI", "accountReference": "BOLT01", "netAmount": 60, "reference": "P-1" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["successCount"], 3);

    let (_, _, body) = send(&gw.app, "GET", "/api/search/salesledger", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, _, body) = send(&gw.app, "GET", "/api/search/salesledger?type=si", None).await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["reference"], "S-1");

    let (_, _, body) = send(
        &gw.app,
        "GET",
        "/api/search/purchaseledger?account=bolt01",
        None,
    )
    .await;
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["accountRef"], "BOLT01");

    let (_, _, body) = send(&gw.app, "GET", "/api/transactions?account=ACME01", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_ledger_search_rejects_bad_filters() {
    let gw = gateway();

    let (status, _, body) = send(&gw.app, "GET", "/api/transactions?type=ZZ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Unknown transaction type: ZZ");

    let (status, _, body) = send(
        &gw.app,
        "GET",
        "/api/search/salesledger?account=TOOLONGREF",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "account must be 8 characters or fewer");
}

#[tokio::test]
async fn test_transaction_search_defaults_to_100_rows() {
    let gw = gateway();
    let items: Vec<Value> = (0..105)
        .map(|n| json!({ "type": "BP", "netAmount": 1, "reference": format!("BP{}", n) }))
        .collect();

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/transactions/batch",
        Some(json!({ "transactions": items })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["successCount"], 105);

    let (_, _, body) = send(&gw.app, "GET", "/api/transactions", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 100);

    let (_, _, body) = send(&gw.app, "GET", "/api/transactions?limit=0", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn test_project_customer_must_exist() {
    let gw = gateway();

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/projects",
        Some(json!({ "reference": "PRJ1", "name": "Fit-out", "customerAccount": "NOPE" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(message(&body), "Customer account NOPE not found");
    assert_eq!(gw.controls.account_creates(), 0);

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/projects",
        Some(json!({ "reference": "PRJ1", "name": "Fit-out", "customerAccount": "acme01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["reference"], "PRJ1");

    let (status, _, body) = send(
        &gw.app,
        "POST",
        "/api/projects",
        Some(json!({ "reference": "prj1", "name": "Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Project prj1 already exists");

    let (_, _, body) = send(&gw.app, "GET", "/api/search/projects?search=fit", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_company_reference_endpoints() {
    let gw = gateway();

    let (status, _, body) = send(&gw.app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connected"], true);

    let (_, _, body) = send(&gw.app, "GET", "/api/version", None).await;
    assert_eq!(body["data"]["gatewayVersion"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["data"]["engineVersion"], "sandbox-1.0");

    let (_, _, body) = send(&gw.app, "GET", "/api/taxcodes", None).await;
    assert!(!body["data"].as_array().unwrap().is_empty());
}

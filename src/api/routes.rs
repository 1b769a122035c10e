//! API Routes
//!
//! HTTP endpoint definitions.

use axum::http::Method;

use crate::engine::EngineHandle;
use crate::handlers::{
    accounts, batch, company, journals, nominals, orders, payments, postings, products, projects,
    search,
};

use super::context::Services;
use super::openapi;
use super::router::{Dispatcher, RouteTable};

/// Build the route table
pub fn create_route_table() -> RouteTable {
    RouteTable::new()
        // Company & reference data
        .route(
            Method::GET,
            "/api/company",
            "Company details",
            company::company,
        )
        .route(
            Method::GET,
            "/api/status",
            "Engine connection status",
            company::status,
        )
        .route(
            Method::GET,
            "/api/version",
            "Gateway and engine versions",
            company::version,
        )
        .route(Method::GET, "/api/setup", "Company setup", company::setup)
        .route(
            Method::GET,
            "/api/financialyear",
            "Current financial year",
            company::financial_year,
        )
        .route(
            Method::GET,
            "/api/taxcodes",
            "Tax codes",
            company::tax_codes,
        )
        .route(
            Method::GET,
            "/api/currencies",
            "Currencies",
            company::currencies,
        )
        .route(
            Method::GET,
            "/api/departments",
            "Departments",
            company::departments,
        )
        .route(Method::GET, "/api/banks", "Bank accounts", company::banks)
        .route(
            Method::GET,
            "/api/paymentmethods",
            "Payment methods",
            company::payment_methods,
        )
        .route(
            Method::GET,
            "/api/coa",
            "Chart of accounts",
            company::chart_of_accounts,
        )
        // Customers
        .route(
            Method::GET,
            "/api/customers",
            "List customers",
            accounts::list_customers,
        )
        .route(
            Method::POST,
            "/api/customers",
            "Create customer",
            accounts::create_customer,
        )
        .route(
            Method::GET,
            "/api/customers/{accountRef}",
            "Get customer",
            accounts::get_customer,
        )
        .route(
            Method::GET,
            "/api/customers/{accountRef}/exists",
            "Customer exists",
            accounts::customer_exists,
        )
        .route(
            Method::GET,
            "/api/customers/{accountRef}/addresses",
            "Customer addresses",
            accounts::customer_addresses,
        )
        // Suppliers
        .route(
            Method::GET,
            "/api/suppliers",
            "List suppliers",
            accounts::list_suppliers,
        )
        .route(
            Method::POST,
            "/api/suppliers",
            "Create supplier",
            accounts::create_supplier,
        )
        .route(
            Method::GET,
            "/api/suppliers/{accountRef}",
            "Get supplier",
            accounts::get_supplier,
        )
        .route(
            Method::GET,
            "/api/suppliers/{accountRef}/exists",
            "Supplier exists",
            accounts::supplier_exists,
        )
        // Sales & purchase postings
        .route(
            Method::POST,
            "/api/sales/invoice",
            "Post sales invoice",
            postings::sales_invoice,
        )
        .route(
            Method::POST,
            "/api/sales/credit",
            "Post sales credit",
            postings::sales_credit,
        )
        .route(
            Method::POST,
            "/api/sales/receipt",
            "Post sales receipt",
            postings::sales_receipt,
        )
        .route(
            Method::POST,
            "/api/purchases/invoice",
            "Post purchase invoice",
            postings::purchase_invoice,
        )
        .route(
            Method::POST,
            "/api/purchases/credit",
            "Post purchase credit",
            postings::purchase_credit,
        )
        .route(
            Method::POST,
            "/api/purchases/payment",
            "Post purchase payment",
            postings::purchase_payment,
        )
        // Bank
        .route(
            Method::POST,
            "/api/bank/payment",
            "Post bank payment",
            postings::bank_payment,
        )
        .route(
            Method::POST,
            "/api/bank/receipt",
            "Post bank receipt",
            postings::bank_receipt,
        )
        // Nominal ledger & journals
        .route(
            Method::GET,
            "/api/nominals",
            "List nominal codes",
            nominals::list_nominals,
        )
        .route(
            Method::POST,
            "/api/nominals",
            "Create nominal code",
            nominals::create_nominal,
        )
        .route(
            Method::GET,
            "/api/nominals/{code}/exists",
            "Nominal code exists",
            nominals::nominal_exists,
        )
        .route(
            Method::POST,
            "/api/journals",
            "Post journal",
            journals::post_journal,
        )
        .route(
            Method::POST,
            "/api/journals/simple",
            "Post two-line journal",
            journals::post_simple_journal,
        )
        // Products & stock
        .route(
            Method::GET,
            "/api/products",
            "List products",
            products::list_products,
        )
        .route(
            Method::POST,
            "/api/products",
            "Create product",
            products::create_product,
        )
        .route(
            Method::GET,
            "/api/products/{code}",
            "Get product",
            products::get_product,
        )
        .route(
            Method::PATCH,
            "/api/products/{code}",
            "Update product",
            products::update_product,
        )
        .route(
            Method::DELETE,
            "/api/products/{code}",
            "Delete product",
            products::delete_product,
        )
        .route(
            Method::GET,
            "/api/stock",
            "Stock levels",
            products::list_stock,
        )
        .route(
            Method::POST,
            "/api/stock",
            "Adjust stock",
            products::adjust_stock,
        )
        // Sales orders
        .route(
            Method::GET,
            "/api/salesorders",
            "List sales orders",
            orders::list_sales_orders,
        )
        .route(
            Method::POST,
            "/api/salesorders",
            "Create sales order",
            orders::create_sales_order,
        )
        .route(
            Method::GET,
            "/api/salesorders/{number}",
            "Get sales order",
            orders::get_sales_order,
        )
        .route(
            Method::PATCH,
            "/api/salesorders/{number}",
            "Update sales order",
            orders::update_sales_order,
        )
        .route(
            Method::DELETE,
            "/api/salesorders/{number}",
            "Delete sales order",
            orders::delete_sales_order,
        )
        .route(
            Method::POST,
            "/api/salesorders/{number}/complete",
            "Complete sales order",
            orders::complete_sales_order,
        )
        // Purchase orders
        .route(
            Method::GET,
            "/api/purchaseorders",
            "List purchase orders",
            orders::list_purchase_orders,
        )
        .route(
            Method::POST,
            "/api/purchaseorders",
            "Create purchase order",
            orders::create_purchase_order,
        )
        .route(
            Method::GET,
            "/api/purchaseorders/{number}",
            "Get purchase order",
            orders::get_purchase_order,
        )
        .route(
            Method::PATCH,
            "/api/purchaseorders/{number}",
            "Update purchase order",
            orders::update_purchase_order,
        )
        .route(
            Method::DELETE,
            "/api/purchaseorders/{number}",
            "Delete purchase order",
            orders::delete_purchase_order,
        )
        .route(
            Method::POST,
            "/api/purchaseorders/{number}/complete",
            "Complete purchase order",
            orders::complete_purchase_order,
        )
        // Ledger queries
        .route(
            Method::GET,
            "/api/search/salesledger",
            "Search sales ledger",
            search::search_sales_ledger,
        )
        .route(
            Method::GET,
            "/api/search/purchaseledger",
            "Search purchase ledger",
            search::search_purchase_ledger,
        )
        .route(
            Method::GET,
            "/api/transactions",
            "Search all transactions",
            search::search_transactions,
        )
        .route(
            Method::GET,
            "/api/ageddebtors",
            "Aged debtors",
            search::aged_debtors,
        )
        .route(
            Method::GET,
            "/api/agedcreditors",
            "Aged creditors",
            search::aged_creditors,
        )
        // Batch & allocation
        .route(
            Method::POST,
            "/api/transactions/batch",
            "Post transaction batch",
            batch::post_batch,
        )
        .route(
            Method::POST,
            "/api/payments/allocate",
            "Allocate payment to invoice",
            payments::allocate_payment,
        )
        // Projects
        .route(
            Method::GET,
            "/api/projects",
            "List projects",
            projects::list_projects,
        )
        .route(
            Method::POST,
            "/api/projects",
            "Create project",
            projects::create_project,
        )
        .route(
            Method::GET,
            "/api/search/projects",
            "Search projects",
            projects::list_projects,
        )
        .route(
            Method::GET,
            "/api/projectcostcodes",
            "Project cost codes",
            projects::project_cost_codes,
        )
        // API description
        .route(
            Method::GET,
            "/api/swagger.json",
            "OpenAPI document",
            openapi::swagger,
        )
}

/// Build the dispatcher over an engine session
pub fn create_dispatcher(engine: EngineHandle) -> Dispatcher {
    Dispatcher::new(create_route_table(), Services::new(engine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_routes_are_unique() {
        let routes = create_route_table();
        let mut seen = HashSet::new();
        for route in routes.iter() {
            assert!(
                seen.insert((route.method.clone(), route.pattern.as_str().to_string())),
                "duplicate route {} {}",
                route.method,
                route.pattern.as_str()
            );
        }
    }

    #[test]
    fn test_batch_route_is_not_shadowed() {
        let routes = create_route_table();
        let (route, _) = routes
            .find(&Method::POST, "/api/transactions/batch")
            .unwrap();
        assert_eq!(route.pattern.as_str(), "/api/transactions/batch");
    }

    #[test]
    fn test_exists_route_needs_full_shape() {
        let routes = create_route_table();
        let (route, params) = routes
            .find(&Method::GET, "/api/customers/ABC/exists")
            .unwrap();
        assert_eq!(route.pattern.as_str(), "/api/customers/{accountRef}/exists");
        assert_eq!(params.get("accountRef"), Some("ABC"));
    }
}

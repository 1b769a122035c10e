//! Request handlers
//!
//! One module per resource. Every handler has the [`Handler`](crate::api::router::Handler)
//! signature and is bound to its path in `api::routes`.

pub mod accounts;
pub mod batch;
pub mod company;
pub mod journals;
pub mod nominals;
pub mod orders;
pub mod payments;
pub mod postings;
pub mod products;
pub mod projects;
pub mod search;

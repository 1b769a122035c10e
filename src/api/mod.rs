//! API module
//!
//! Route table, dispatcher, envelope and the axum server around them.

pub mod context;
pub mod envelope;
pub mod middleware;
pub mod openapi;
pub mod request;
pub mod router;
pub mod routes;
pub mod server;

pub use context::{Reply, ReplyBody, RequestContext, Services};
pub use envelope::{ApiResponse, Envelope};
pub use router::{Dispatcher, RouteTable};
pub use routes::{create_dispatcher, create_route_table};
pub use server::{create_router, GatewayState};

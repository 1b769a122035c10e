//! Route table and dispatcher
//!
//! Routes are declared once as (method, pattern, handler) and evaluated in a
//! single ordered pass. A pattern only matches a path with the same number of
//! segments, and routes with more literal segments are tried first, so
//! `/api/products/{code}` can never shadow a literal sibling of the same shape.

use axum::http::Method;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{panic_message, AppError, AppResult};

use super::context::{Reply, RequestContext, Services};
use super::envelope::ApiResponse;
use super::request::{ApiRequest, PathParams};

/// Handler bound to a route
pub type Handler = fn(&RequestContext<'_>) -> AppResult<Reply>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture(String),
}

/// Path pattern with literal segments and `{name}` captures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_path(pattern)
            .into_iter()
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                {
                    Some(name) => Segment::Capture(name.to_string()),
                    None => Segment::Literal(segment.to_string()),
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Literal(_)))
            .count()
    }

    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a request path, returning the decoded captures
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        if !path.starts_with('/') {
            return None;
        }

        let parts = split_path(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name, percent_decode(part)?);
                }
            }
        }

        Some(params)
    }
}

/// Split a path into segments, tolerating one trailing slash
fn split_path(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }
    path.split('/').collect()
}

/// Decode `%XX` escapes; `None` for malformed escapes or non-UTF-8 results
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok()
}

/// A single route
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub summary: &'static str,
    pub handler: Handler,
}

/// Ordered, immutable set of routes
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route. Routes with more literal segments sort ahead of routes
    /// with fewer; otherwise declaration order is kept.
    pub fn route(
        mut self,
        method: Method,
        pattern: &str,
        summary: &'static str,
        handler: Handler,
    ) -> Self {
        let pattern = PathPattern::parse(pattern);
        let position = self
            .routes
            .iter()
            .position(|route| route.pattern.literal_count() < pattern.literal_count())
            .unwrap_or(self.routes.len());

        self.routes.insert(
            position,
            Route {
                method,
                pattern,
                summary,
                handler,
            },
        );
        self
    }

    /// First route matching both method and path
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Routes requests to handlers and converts every outcome into a response
pub struct Dispatcher {
    routes: RouteTable,
    services: Services,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, services: Services) -> Self {
        Self { routes, services }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn dispatch(&self, request: &ApiRequest) -> ApiResponse {
        if request.method == Method::OPTIONS {
            return ApiResponse::preflight();
        }

        let Some((route, params)) = self.routes.find(&request.method, &request.path) else {
            return ApiResponse::from_error(&AppError::RouteNotFound {
                method: request.method.to_string(),
                path: request.path.clone(),
            });
        };

        tracing::debug!(
            method = %request.method,
            route = route.pattern.as_str(),
            correlation_id = ?request.correlation_id,
            "Dispatching request"
        );

        let context = RequestContext {
            services: &self.services,
            routes: &self.routes,
            params: &params,
            query: &request.query,
            body: &request.body,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| (route.handler)(&context))) {
            Ok(Ok(reply)) => ApiResponse::from_reply(reply),
            Ok(Err(err)) => ApiResponse::from_error(&err),
            Err(payload) => ApiResponse::from_error(&AppError::Internal(panic_message(
                payload.as_ref(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineHandle, InMemoryEngine};
    use axum::http::StatusCode;
    use serde_json::json;

    fn which(name: &'static str, ctx: &RequestContext<'_>) -> AppResult<Reply> {
        let captured: Vec<&str> = ["ref", "code"]
            .into_iter()
            .filter_map(|key| ctx.params.get(key))
            .collect();
        Reply::ok(&json!({ "route": name, "captured": captured }))
    }

    fn by_ref(ctx: &RequestContext<'_>) -> AppResult<Reply> {
        which("by_ref", ctx)
    }

    fn exists(ctx: &RequestContext<'_>) -> AppResult<Reply> {
        which("exists", ctx)
    }

    fn literal(ctx: &RequestContext<'_>) -> AppResult<Reply> {
        which("literal", ctx)
    }

    fn failing(_: &RequestContext<'_>) -> AppResult<Reply> {
        Err(AppError::validation("name is required"))
    }

    fn panicking(_: &RequestContext<'_>) -> AppResult<Reply> {
        panic!("handler exploded")
    }

    fn dispatcher() -> Dispatcher {
        let routes = RouteTable::new()
            .route(Method::GET, "/api/items/{ref}", "by ref", by_ref)
            .route(Method::GET, "/api/items/{ref}/exists", "exists", exists)
            .route(Method::GET, "/api/items/special", "literal", literal)
            .route(Method::POST, "/api/fail", "fail", failing)
            .route(Method::POST, "/api/panic", "panic", panicking);
        Dispatcher::new(
            routes,
            Services::new(EngineHandle::new(InMemoryEngine::sandbox())),
        )
    }

    fn get(dispatcher: &Dispatcher, method: Method, target: &str) -> ApiResponse {
        dispatcher.dispatch(&ApiRequest::from_target(method, target, ""))
    }

    fn route_name(response: &ApiResponse) -> String {
        response.envelope().unwrap().data.as_ref().unwrap()["route"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_pattern_requires_same_shape() {
        let pattern = PathPattern::parse("/api/customers/{accountRef}");
        assert!(pattern.matches("/api/customers/ABC").is_some());
        assert!(pattern.matches("/api/customers").is_none());
        assert!(pattern.matches("/api/customers/ABC/exists").is_none());
        assert!(pattern.matches("/api/suppliers/ABC").is_none());
    }

    #[test]
    fn test_capture_is_unescaped() {
        let pattern = PathPattern::parse("/api/products/{code}");
        let params = pattern.matches("/api/products/BOX%20LARGE").unwrap();
        assert_eq!(params.get("code"), Some("BOX LARGE"));
    }

    #[test]
    fn test_capture_rejects_empty_and_bad_escapes() {
        let pattern = PathPattern::parse("/api/{code}/exists");
        assert!(pattern.matches("/api//exists").is_none());
        assert!(pattern.matches("/api/%zz/exists").is_none());
    }

    #[test]
    fn test_trailing_slash_is_tolerated() {
        let pattern = PathPattern::parse("/api/customers");
        assert!(pattern.matches("/api/customers/").is_some());
    }

    #[test]
    fn test_literal_route_beats_capture_of_same_shape() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, Method::GET, "/api/items/special");
        assert_eq!(route_name(&response), "literal");

        let response = get(&dispatcher, Method::GET, "/api/items/other");
        assert_eq!(route_name(&response), "by_ref");
    }

    #[test]
    fn test_longer_route_matches_full_shape() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, Method::GET, "/api/items/abc/exists");
        assert_eq!(route_name(&response), "exists");
    }

    #[test]
    fn test_no_route_is_404_with_method_and_path() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, Method::DELETE, "/api/items/abc");
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(
            response.envelope().unwrap().error.as_deref(),
            Some("Endpoint not found: DELETE /api/items/abc")
        );
    }

    #[test]
    fn test_options_short_circuits_routing() {
        let dispatcher = dispatcher();
        for target in ["/api/items/abc", "/does/not/exist", "/"] {
            let response = get(&dispatcher, Method::OPTIONS, target);
            assert_eq!(response.status, StatusCode::NO_CONTENT);
            assert!(response.envelope().is_none());
        }
    }

    #[test]
    fn test_handler_error_becomes_envelope() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, Method::POST, "/api/fail");
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let envelope = response.envelope().unwrap();
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("name is required"));
    }

    #[test]
    fn test_panicking_handler_becomes_500() {
        let dispatcher = dispatcher();
        let response = get(&dispatcher, Method::POST, "/api/panic");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.envelope().unwrap().error.as_deref(),
            Some("handler exploded")
        );
    }
}

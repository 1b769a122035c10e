//! HTTP server binding
//!
//! axum owns the socket and the middleware stack. Every request lands in a
//! single fallback handler that hands it to the [`Dispatcher`] on the blocking
//! pool, because handlers hold the engine session lock for the whole call.

use axum::{
    body::{to_bytes, Bytes},
    extract::{Request, State},
    http::request::Parts,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::AppError;

use super::envelope::ApiResponse;
use super::middleware::{logging_middleware, CorrelationId};
use super::request::ApiRequest;
use super::router::Dispatcher;

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// State shared by every request
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub request_timeout: Duration,
}

/// Build the axum router around a dispatcher
pub fn create_router(dispatcher: Dispatcher, request_timeout: Duration) -> Router {
    let state = GatewayState {
        dispatcher: Arc::new(dispatcher),
        request_timeout,
    };

    // Order: trace -> logging -> handler
    Router::new()
        .fallback(handle_request)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(logging_middleware)),
        )
        .with_state(state)
}

async fn handle_request(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read request body");
            return ApiResponse::from_error(&AppError::InvalidBody).into_response();
        }
    };

    let api_request = to_api_request(parts, bytes);
    let dispatcher = state.dispatcher.clone();
    let work = tokio::task::spawn_blocking(move || dispatcher.dispatch(&api_request));

    let response = match tokio::time::timeout(state.request_timeout, work).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            ApiResponse::from_error(&AppError::Internal(format!("Request worker failed: {}", err)))
        }
        Err(_) => ApiResponse::from_error(&AppError::Timeout(state.request_timeout.as_secs())),
    };

    response.into_response()
}

/// Request as handed to the dispatcher, carrying the middleware's correlation ID
fn to_api_request(parts: Parts, body: Bytes) -> ApiRequest {
    let correlation_id = parts.extensions.get::<CorrelationId>().map(|id| id.0);
    ApiRequest::new(parts.method, &parts.uri, body).with_correlation_id(correlation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Request as HttpRequest};
    use uuid::Uuid;

    #[test]
    fn test_correlation_id_reaches_dispatcher_request() {
        let id = Uuid::new_v4();
        let mut request = HttpRequest::builder()
            .method(Method::POST)
            .uri("/api/customers?limit=5")
            .body(())
            .unwrap();
        request.extensions_mut().insert(CorrelationId(id));
        let (parts, _) = request.into_parts();

        let api_request = to_api_request(parts, Bytes::from_static(b"{}"));
        assert_eq!(api_request.correlation_id, Some(id));
        assert_eq!(api_request.path, "/api/customers");
        assert_eq!(api_request.query.get("limit"), Some("5"));
    }

    #[test]
    fn test_missing_correlation_id_is_none() {
        let (parts, _) = HttpRequest::builder()
            .uri("/api/status")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(to_api_request(parts, Bytes::new()).correlation_id, None);
    }
}

//! Handler context
//!
//! What a handler gets to work with: the shared services, the route table,
//! captured path values, the query string and the raw body.

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{reference_or_generate, ReferenceGenerator};
use crate::engine::EngineHandle;
use crate::error::{AppError, AppResult};

use super::request::{decode, decode_required, PathParams, QueryParams};
use super::router::RouteTable;

/// Process-wide services shared by every handler
#[derive(Debug)]
pub struct Services {
    pub engine: EngineHandle,
    pub references: ReferenceGenerator,
}

impl Services {
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            engine,
            references: ReferenceGenerator::new(),
        }
    }
}

/// Per-request view handed to handlers
pub struct RequestContext<'a> {
    pub services: &'a Services,
    pub routes: &'a RouteTable,
    pub params: &'a PathParams,
    pub query: &'a QueryParams,
    pub body: &'a [u8],
}

impl<'a> RequestContext<'a> {
    pub fn engine(&self) -> &EngineHandle {
        &self.services.engine
    }

    pub fn references(&self) -> &ReferenceGenerator {
        &self.services.references
    }

    /// Captured path segment; a missing capture means the route table is wrong
    pub fn param(&self, name: &str) -> AppResult<&str> {
        self.params
            .get(name)
            .ok_or_else(|| AppError::Internal(format!("Route is missing path parameter {}", name)))
    }

    pub fn body<T: DeserializeOwned>(&self) -> AppResult<T> {
        decode_required(self.body)
    }

    pub fn optional_body<T: DeserializeOwned>(&self) -> AppResult<Option<T>> {
        decode(self.body)
    }

    /// The caller's reference, or a generated `{prefix}-{timestamp}`
    pub fn reference(&self, supplied: Option<String>, prefix: &str) -> String {
        reference_or_generate(supplied, prefix, self.references())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// Wrapped in the success envelope
    Data(Value),
    /// Written as-is
    Raw(Value),
}

/// Successful handler outcome
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

impl Reply {
    /// 200 with the payload as envelope data
    pub fn ok<T: Serialize>(payload: &T) -> AppResult<Self> {
        Ok(Self {
            status: StatusCode::OK,
            body: ReplyBody::Data(serde_json::to_value(payload)?),
        })
    }

    /// 201 with the created resource as envelope data
    pub fn created<T: Serialize>(payload: &T) -> AppResult<Self> {
        Ok(Self {
            status: StatusCode::CREATED,
            body: ReplyBody::Data(serde_json::to_value(payload)?),
        })
    }

    /// 200 with an unwrapped JSON document
    pub fn raw(document: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Raw(document),
        }
    }
}

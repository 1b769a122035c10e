//! Request decoding and validation
//!
//! Handlers receive the raw body and query string. This module turns them
//! into typed values and holds the shared field checks, so every endpoint
//! reports missing or malformed input with the same messages.

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{Method, Uri};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{AccountRef, AccountRefError, MAX_ACCOUNT_REF_LEN};
use crate::error::{AppError, AppResult};

pub const MAX_REFERENCE_LEN: usize = 30;
pub const MAX_DETAILS_LEN: usize = 60;
pub const MAX_NOMINAL_CODE_LEN: usize = 8;
pub const MAX_PRODUCT_CODE_LEN: usize = 30;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// An inbound request as seen by the dispatcher
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: Bytes,
    pub correlation_id: Option<Uuid>,
}

impl ApiRequest {
    pub fn new(method: Method, uri: &Uri, body: Bytes) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            query: QueryParams::from_uri(uri),
            body,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: Option<Uuid>) -> Self {
        self.correlation_id = id;
        self
    }

    /// Build a request from a path-and-query target such as `/api/customers?limit=5`
    pub fn from_target(method: Method, target: &str, body: impl Into<Bytes>) -> Self {
        match target.parse::<Uri>() {
            Ok(uri) => Self::new(method, &uri, body.into()),
            Err(_) => Self {
                method,
                path: target.to_string(),
                query: QueryParams::default(),
                body: body.into(),
                correlation_id: None,
            },
        }
    }
}

/// Query string parameters
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn from_uri(uri: &Uri) -> Self {
        Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(params)| Self(params))
            .unwrap_or_default()
    }

    /// Trimmed, non-blank value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub fn search(&self) -> Option<String> {
        self.get("search").map(str::to_string)
    }

    /// Positive `limit`, or `default` when missing, unparsable or not positive
    pub fn limit(&self, default: usize) -> usize {
        self.get("limit")
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(default)
    }

    /// Date parameter; unparsable values are ignored
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(parse_date)
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Values captured from the path pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn push(&mut self, name: &str, value: String) {
        self.0.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =========================================================================
// Body decoding
// =========================================================================

/// Decode a JSON body. An empty body decodes to `None`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> AppResult<Option<T>> {
    let body = body.strip_prefix(UTF8_BOM).unwrap_or(body);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(body).map(Some).map_err(|err| {
        tracing::debug!(error = %err, "Rejected request body");
        AppError::InvalidBody
    })
}

/// Decode a JSON body that the endpoint cannot do without
pub fn decode_required<T: DeserializeOwned>(body: &[u8]) -> AppResult<T> {
    decode(body)?.ok_or_else(|| AppError::validation("Request body is required"))
}

// =========================================================================
// Field validation
// =========================================================================

/// Trim a string, mapping blank to `None`
pub fn optional_string(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn required_string(field: &str, value: Option<String>) -> AppResult<String> {
    optional_string(value).ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

pub fn bounded(field: &str, value: String, max: usize) -> AppResult<String> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} must be {} characters or fewer",
            field, max
        )));
    }
    Ok(value)
}

pub fn optional_bounded(
    field: &str,
    value: Option<String>,
    max: usize,
) -> AppResult<Option<String>> {
    optional_string(value)
        .map(|value| bounded(field, value, max))
        .transpose()
}

pub fn required_bounded(field: &str, value: Option<String>, max: usize) -> AppResult<String> {
    bounded(field, required_string(field, value)?, max)
}

pub fn account_ref(field: &str, value: Option<&str>) -> AppResult<AccountRef> {
    AccountRef::parse(value.unwrap_or_default()).map_err(|err| match err {
        AccountRefError::Empty => AppError::validation(format!("{} is required", field)),
        AccountRefError::TooLong(_) => AppError::validation(format!(
            "{} must be {} characters or fewer",
            field, MAX_ACCOUNT_REF_LEN
        )),
    })
}

pub fn optional_account_ref(field: &str, value: Option<&str>) -> AppResult<Option<AccountRef>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => account_ref(field, Some(value)).map(Some),
        None => Ok(None),
    }
}

pub fn positive_amount(field: &str, value: Option<Decimal>) -> AppResult<Decimal> {
    let value = value.ok_or_else(|| AppError::validation(format!("{} is required", field)))?;
    if value <= Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(value)
}

pub fn non_negative_amount(field: &str, value: Option<Decimal>) -> AppResult<Decimal> {
    let value = value.unwrap_or(Decimal::ZERO);
    if value < Decimal::ZERO {
        return Err(AppError::validation(format!("{} must not be negative", field)));
    }
    Ok(value)
}

/// Nominal code from the request, or the supplied default
pub fn nominal_or(field: &str, value: Option<String>, default: &str) -> AppResult<String> {
    Ok(optional_bounded(field, value, MAX_NOMINAL_CODE_LEN)?
        .unwrap_or_else(|| default.to_string()))
}

/// Tax code from the request (uppercased), or the supplied default
pub fn tax_code_or(value: Option<String>, default: &str) -> String {
    optional_string(value)
        .map(|code| code.to_uppercase())
        .unwrap_or_else(|| default.to_string())
}

pub fn date_or_today(value: Option<NaiveDate>) -> NaiveDate {
    value.unwrap_or_else(|| Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
    }

    fn query(target: &str) -> QueryParams {
        ApiRequest::from_target(Method::GET, target, Bytes::new()).query
    }

    #[test]
    fn test_decode_empty_body_is_absent() {
        let decoded: Option<Sample> = decode(b"").unwrap();
        assert!(decoded.is_none());
        let decoded: Option<Sample> = decode(b"  \n").unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode::<Sample>(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::InvalidBody));
        assert_eq!(err.to_string(), "Invalid request body");
    }

    #[test]
    fn test_decode_shape_mismatch() {
        let err = decode::<Sample>(br#"{"name": 42}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidBody));
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut body = UTF8_BOM.to_vec();
        body.extend_from_slice(br#"{"name":"x"}"#);
        let decoded: Sample = decode(&body).unwrap().unwrap();
        assert_eq!(decoded.name, "x");
    }

    #[test]
    fn test_decode_required_rejects_empty() {
        let err = decode_required::<Sample>(b"").unwrap_err();
        assert_eq!(err.to_string(), "Request body is required");
    }

    #[test]
    fn test_limit_fallbacks() {
        assert_eq!(query("/x?limit=-5").limit(50), 50);
        assert_eq!(query("/x?limit=0").limit(50), 50);
        assert_eq!(query("/x?limit=abc").limit(50), 50);
        assert_eq!(query("/x").limit(50), 50);
        assert_eq!(query("/x?limit=7").limit(50), 7);
    }

    #[test]
    fn test_correlation_id_defaults_to_none() {
        let request = ApiRequest::from_target(Method::GET, "/api/status", Bytes::new());
        assert_eq!(request.correlation_id, None);

        let id = Uuid::new_v4();
        assert_eq!(request.with_correlation_id(Some(id)).correlation_id, Some(id));
    }

    #[test]
    fn test_blank_search_is_absent() {
        assert_eq!(query("/x?search=").search(), None);
        assert_eq!(query("/x?search=acme").search(), Some("acme".to_string()));
        assert_eq!(query("/x?search=big%20co").search(), Some("big co".to_string()));
    }

    #[test]
    fn test_unparsable_dates_are_ignored() {
        let params = query("/x?from=2026-01-31&to=yesterday");
        assert_eq!(params.date("from"), NaiveDate::from_ymd_opt(2026, 1, 31));
        assert_eq!(params.date("to"), None);
        assert_eq!(
            query("/x?from=15/02/2026").date("from"),
            NaiveDate::from_ymd_opt(2026, 2, 15)
        );
    }

    #[test]
    fn test_account_ref_messages() {
        let err = account_ref("customerAccount", Some("TOOLONGREF")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "customerAccount must be 8 characters or fewer"
        );

        let err = account_ref("customerAccount", None).unwrap_err();
        assert_eq!(err.to_string(), "customerAccount is required");

        assert_eq!(
            account_ref("customerAccount", Some("abc")).unwrap().as_str(),
            "ABC"
        );
    }

    #[test]
    fn test_required_string_rejects_whitespace() {
        let err = required_string("name", Some("   ".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn test_bounded_strings() {
        assert!(required_bounded("reference", Some("a".repeat(30)), MAX_REFERENCE_LEN).is_ok());
        let err =
            required_bounded("reference", Some("a".repeat(31)), MAX_REFERENCE_LEN).unwrap_err();
        assert_eq!(err.to_string(), "reference must be 30 characters or fewer");
        assert_eq!(optional_bounded("details", Some(" ".to_string()), 60).unwrap(), None);
    }

    #[test]
    fn test_amount_checks() {
        assert_eq!(positive_amount("netAmount", Some(dec!(1.5))).unwrap(), dec!(1.5));
        assert_eq!(
            positive_amount("netAmount", None).unwrap_err().to_string(),
            "netAmount is required"
        );
        assert_eq!(
            positive_amount("netAmount", Some(dec!(0))).unwrap_err().to_string(),
            "netAmount must be greater than zero"
        );
        assert_eq!(non_negative_amount("taxAmount", None).unwrap(), Decimal::ZERO);
        assert!(non_negative_amount("taxAmount", Some(dec!(-1))).is_err());
    }

    #[test]
    fn test_code_defaults() {
        assert_eq!(nominal_or("nominalCode", None, "4000").unwrap(), "4000");
        assert_eq!(
            nominal_or("nominalCode", Some(" 7500 ".to_string()), "4000").unwrap(),
            "7500"
        );
        assert_eq!(tax_code_or(Some("t0".to_string()), "T1"), "T0");
        assert_eq!(tax_code_or(None, "T1"), "T1");
    }
}

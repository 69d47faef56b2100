//! Purpose: Map per-request failures onto the JSON error envelope.
//! Exports: `IngressError`, `ValidationIssue`, envelope text constants.
//! Role: Single place that owns status codes and envelope wording for the router.
//! Invariants: Every failure renders `error` + `detail` plus context-specific extra fields
//! (`message`, `position`, or `validation_errors`).
//! Invariants: Body-read and invalid-JSON failures are 400; schema failures are 422.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::json::parse::DecodeFailure;

pub const BODY_READ_ERROR: &str = "Bad request";
pub const BODY_READ_DETAIL: &str = "Could not read request body.";
pub const INVALID_JSON_ERROR: &str = "Invalid JSON";
pub const INVALID_JSON_DETAIL: &str = "Request body is not valid JSON.";
pub const VALIDATION_ERROR: &str = "Validation failed";
pub const VALIDATION_DETAIL: &str = "Request body could not be validated. Ensure Content-Type: application/json and the body is valid JSON (e.g. SNS subscription confirmation).";

/// One per-field descriptor reported by the validation formatter.
///
/// `loc` starts with `"body"`; decoder failures append the 1-based line and column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<Value>,
    pub msg: String,
}

#[derive(Debug)]
pub enum IngressError {
    /// The request body stream failed or exceeded the configured limit.
    BodyRead { message: String },
    /// The body was read but is not valid JSON.
    InvalidJson {
        message: String,
        line: usize,
        column: usize,
    },
    /// A schema-bound extractor rejected the request.
    Validation(Vec<ValidationIssue>),
}

impl IngressError {
    pub fn body_read(message: impl Into<String>) -> Self {
        IngressError::BodyRead {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_json(failure: &DecodeFailure) -> Self {
        IngressError::InvalidJson {
            message: failure.message.clone(),
            line: failure.line,
            column: failure.column,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::BodyRead { .. } | IngressError::InvalidJson { .. } => {
                StatusCode::BAD_REQUEST
            }
            IngressError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn envelope(&self) -> ErrorEnvelope<'_> {
        match self {
            IngressError::BodyRead { message } => ErrorEnvelope {
                error: BODY_READ_ERROR,
                detail: BODY_READ_DETAIL,
                message: Some(message),
                position: None,
                validation_errors: None,
            },
            IngressError::InvalidJson {
                message,
                line,
                column,
            } => ErrorEnvelope {
                error: INVALID_JSON_ERROR,
                detail: INVALID_JSON_DETAIL,
                message: Some(message),
                position: Some(Position {
                    line: *line,
                    column: *column,
                }),
                validation_errors: None,
            },
            IngressError::Validation(issues) => ErrorEnvelope {
                error: VALIDATION_ERROR,
                detail: VALIDATION_DETAIL,
                message: None,
                position: None,
                validation_errors: Some(issues),
            },
        }
    }
}

impl fmt::Display for IngressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngressError::BodyRead { message } => write!(f, "{BODY_READ_ERROR}: {message}"),
            IngressError::InvalidJson { message, .. } => {
                write!(f, "{INVALID_JSON_ERROR}: {message}")
            }
            IngressError::Validation(issues) => {
                write!(f, "{VALIDATION_ERROR}: {} issue(s)", issues.len())
            }
        }
    }
}

impl std::error::Error for IngressError {}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: &'static str,
    detail: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation_errors: Option<&'a [ValidationIssue]>,
}

#[derive(Debug, Serialize)]
struct Position {
    line: usize,
    column: usize,
}

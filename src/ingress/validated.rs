//! Purpose: Schema-bound JSON extractor whose rejections use the validation envelope.
//! Exports: `ValidatedJson`.
//! Role: Replaces axum's terse plain-text JSON rejections with a 422 envelope.
//! Invariants: Content-type, body-read, syntax and shape failures all map to `IngressError::Validation`.
//! Invariants: Decoder failures carry `["body", line, column]` in `loc` when the decoder locates them.
//! Notes: Decodes with serde_json directly so the decoder's position survives.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::envelope::{IngressError, ValidationIssue};
use crate::json::parse::{ParseFailureCategory, categorize_error, decoder_position};

/// Deserializes the request body into `T`, like `axum::Json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = IngressError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            return Err(rejected(ValidationIssue {
                kind: "content_type".to_string(),
                loc: vec![json!("body")],
                msg: "Expected request with `Content-Type: application/json`".to_string(),
            }));
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            rejected(ValidationIssue {
                kind: "body_read".to_string(),
                loc: vec![json!("body")],
                msg: rejection.body_text(),
            })
        })?;

        serde_json::from_slice::<T>(&bytes)
            .map(Self)
            .map_err(|err| rejected(decode_issue(&err)))
    }
}

fn rejected(issue: ValidationIssue) -> IngressError {
    tracing::debug!(kind = %issue.kind, "request failed schema validation");
    IngressError::Validation(vec![issue])
}

fn decode_issue(err: &serde_json::Error) -> ValidationIssue {
    let kind = match categorize_error(err) {
        ParseFailureCategory::Data => "json_data",
        ParseFailureCategory::Syntax | ParseFailureCategory::Eof => "json_invalid",
        ParseFailureCategory::Io => "body_read",
    };
    let mut loc: Vec<Value> = vec![json!("body")];
    if let Some((line, column)) = decoder_position(err) {
        loc.push(json!(line));
        loc.push(json!(column));
    }
    ValidationIssue {
        kind: kind.to_string(),
        loc,
        msg: err.to_string(),
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application")
        && (subtype.eq_ignore_ascii_case("json")
            || subtype.to_ascii_lowercase().ends_with("+json"))
}

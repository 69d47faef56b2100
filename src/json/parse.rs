//! Purpose: Decode raw request bytes into a JSON value with located failures.
//! Exports: `decode_payload`, `decoder_position`, `DecodeFailure`, `ParseFailureCategory`,
//! `categorize_error`.
//! Role: Parser boundary that centralizes serde_json usage details.
//! Invariants: Line/column are the decoder's own, both 1-based.
//! Invariants: Any JSON type is accepted; no schema beyond "valid JSON".
//! Notes: serde_json reports column 0 before the first character of a line; that maps to 1.
//! Notes: Envelope mapping is done by callsites so HTTP context stays explicit.

use serde_json::Value;
use serde_json::error::Category;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ParseFailureCategory {
    Syntax,
    Eof,
    Data,
    Io,
}

impl ParseFailureCategory {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ParseFailureCategory::Syntax => "syntax",
            ParseFailureCategory::Eof => "eof",
            ParseFailureCategory::Data => "data",
            ParseFailureCategory::Io => "io",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct DecodeFailure {
    pub(crate) message: String,
    pub(crate) line: usize,
    pub(crate) column: usize,
    pub(crate) category: ParseFailureCategory,
}

impl From<serde_json::Error> for DecodeFailure {
    fn from(err: serde_json::Error) -> Self {
        let (line, column) = decoder_position(&err).unwrap_or((1, 1));
        Self {
            message: err.to_string(),
            line,
            column,
            category: categorize_error(&err),
        }
    }
}

/// 1-based `(line, column)` of a decode failure, or `None` when the decoder
/// has no location (line 0, e.g. data errors raised outside the input).
pub(crate) fn decoder_position(err: &serde_json::Error) -> Option<(usize, usize)> {
    match err.line() {
        0 => None,
        line => Some((line, err.column().max(1))),
    }
}

pub(crate) fn decode_payload(bytes: &[u8]) -> Result<Value, DecodeFailure> {
    serde_json::from_slice(bytes).map_err(DecodeFailure::from)
}

pub(crate) fn categorize_error(err: &serde_json::Error) -> ParseFailureCategory {
    match err.classify() {
        Category::Syntax => ParseFailureCategory::Syntax,
        Category::Eof => ParseFailureCategory::Eof,
        Category::Data => ParseFailureCategory::Data,
        Category::Io => ParseFailureCategory::Io,
    }
}

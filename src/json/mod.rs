//! Purpose: Internal JSON decoding boundary for request payloads.
//! Exports: `parse` module with decode helpers used by the ingress handlers.
//! Role: Single seam for decoder details so handlers avoid ad hoc error mapping.
//! Invariants: Failure positions come from the decoder, never recomputed.

pub(crate) mod parse;

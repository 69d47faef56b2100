//! Purpose: Library crate backing the `webhook-echo` binary and its tests.
//! Exports: `core` (process-level errors), `ingress` (router, handlers, envelopes).
//! Role: Keeps HTTP behavior testable in-process without binding sockets.
//! Invariants: Request handling is stateless; no shared mutable state across requests.
pub mod core;
pub mod ingress;
mod json;

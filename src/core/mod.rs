// Core modules shared by the binary and the ingress router.
pub mod error;

//! HTTP middleware.
//!
//! API key authentication resolving the tenant every lead is scoped to.
pub mod auth;

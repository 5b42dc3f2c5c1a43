//! Toolgate library crate.
//!
//! OAuth 2.0 authorization server gating access to per-principal
//! tool-configuration documents: client provisioning, authorization-code
//! and client-credentials grants, hashed-token introspection and
//! revocation.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
pub mod tools;

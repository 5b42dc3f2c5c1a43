//! Axum HTTP server handlers and middleware for the OAuth endpoints.

pub mod context;
mod handler_index;
mod handler_oauth;
mod handler_resource;
pub mod middleware_auth;
pub mod server;

pub use context::AppState;
pub use server::build_router;

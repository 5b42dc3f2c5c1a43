//! Application state and request context management.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::{AuthorizationServer, JwtTokenCodec};
use crate::storage::traits::OAuthStorage;
use crate::tools::ToolDocumentProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// OAuth storage for principals, clients, codes, and token records
    pub oauth_storage: Arc<dyn OAuthStorage + Send + Sync>,
    /// Authorization server implementing the OAuth grant flows
    pub auth_server: Arc<AuthorizationServer>,
    /// Bearer token codec shared with the resource gate
    pub token_codec: Arc<JwtTokenCodec>,
    /// Produces the protected tool-configuration document
    pub tool_documents: Arc<dyn ToolDocumentProvider>,
}

//! Per-principal tool document provider.
//!
//! The authorization server gates access to a generated tool-configuration
//! document; producing that document is an external concern behind this
//! trait. The bundled provider renders a minimal placeholder so the server
//! is usable standalone.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::oauth::types::Principal;

/// Produces the tool-configuration document for a principal
#[async_trait]
pub trait ToolDocumentProvider: Send + Sync {
    async fn document_for(&self, principal: &Principal) -> Result<String, StorageError>;
}

/// Placeholder provider that renders an empty tool document
#[derive(Default)]
pub struct StaticToolDocumentProvider;

#[async_trait]
impl ToolDocumentProvider for StaticToolDocumentProvider {
    async fn document_for(&self, principal: &Principal) -> Result<String, StorageError> {
        Ok(format!(
            "# Tool configuration for {} (principal {})\n# No tools enabled.\n",
            principal.name, principal.id
        ))
    }
}

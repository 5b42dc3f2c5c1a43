//! Client provisioning.
//!
//! Each known principal gets exactly one OAuth client, created on demand
//! with a freshly generated secret. The cleartext secret exists only in
//! the return value of registration; storage keeps the bcrypt hash.

use chrono::Utc;
use std::sync::Arc;

use crate::errors::OAuthError;
use crate::oauth::types::{Client, GrantType, Principal, generate_token};
use crate::storage::{ClientStore, OAuthStorage, PrincipalStore};

/// Redirect URIs granted to auto-provisioned clients
const DEFAULT_REDIRECT_URIS: &[&str] = &[
    "http://localhost:8501/oauth/callback",
    "urn:ietf:wg:oauth:2.0:oob",
];

/// Outcome of registering a client for a principal
pub struct ProvisionedClient {
    pub client: Client,
    /// The cleartext secret, present only when the client was newly created
    pub secret: Option<String>,
}

/// Provisions one OAuth client per principal
pub struct ClientProvisioningService {
    storage: Arc<dyn OAuthStorage>,
    hash_cost: u32,
}

impl ClientProvisioningService {
    pub fn new(storage: Arc<dyn OAuthStorage>, hash_cost: u32) -> Self {
        Self { storage, hash_cost }
    }

    /// Register a client for a principal, or return the existing one.
    ///
    /// Idempotent: a principal that already owns a client gets it back
    /// with no secret, since the cleartext was only available at creation.
    pub async fn register(&self, principal: &Principal) -> Result<ProvisionedClient, OAuthError> {
        if let Some(existing) = self
            .storage
            .get_client_for_principal(principal.id)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?
        {
            return Ok(ProvisionedClient {
                client: existing,
                secret: None,
            });
        }

        let secret = generate_token();
        let secret_hash = bcrypt::hash(&secret, self.hash_cost)
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        let client = Client {
            client_id: format!("toolgate-user-{}", principal.id),
            secret_hash,
            client_name: format!("{} OAuth Client", principal.name),
            redirect_uris: DEFAULT_REDIRECT_URIS.iter().map(|s| s.to_string()).collect(),
            grant_types: vec![GrantType::AuthorizationCode, GrantType::ClientCredentials],
            principal_id: principal.id,
            created_at: Utc::now(),
        };

        self.storage
            .store_client(&client)
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        tracing::info!(
            client_id = %client.client_id,
            principal_id = principal.id,
            "provisioned OAuth client"
        );

        Ok(ProvisionedClient {
            client,
            secret: Some(secret),
        })
    }

    /// Ensure every known principal has a client, skipping those that do
    pub async fn provision_known_principals(&self) -> Result<usize, OAuthError> {
        let principals = self
            .storage
            .list_principals()
            .await
            .map_err(|e| OAuthError::ServerError(e.to_string()))?;

        let mut created = 0;
        for principal in &principals {
            if self.register(principal).await?.secret.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryOAuthStorage;

    const TEST_BCRYPT_COST: u32 = 4;

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let storage = Arc::new(MemoryOAuthStorage::new());
        let service = ClientProvisioningService::new(storage.clone(), TEST_BCRYPT_COST);

        let principal = Principal {
            id: 3,
            name: "Carol".to_string(),
        };
        storage.store_principal(&principal).await.unwrap();

        let first = service.register(&principal).await.unwrap();
        assert_eq!(first.client.client_id, "toolgate-user-3");
        let secret = first.secret.unwrap();
        assert!(bcrypt::verify(&secret, &first.client.secret_hash).unwrap());

        let second = service.register(&principal).await.unwrap();
        assert_eq!(second.client.client_id, "toolgate-user-3");
        assert!(second.secret.is_none());
    }

    #[tokio::test]
    async fn test_provision_known_principals_skips_existing() {
        let storage = Arc::new(MemoryOAuthStorage::new());
        let service = ClientProvisioningService::new(storage.clone(), TEST_BCRYPT_COST);

        for (id, name) in [(1, "Alice"), (2, "Bob")] {
            storage
                .store_principal(&Principal {
                    id,
                    name: name.to_string(),
                })
                .await
                .unwrap();
        }

        let alice = Principal {
            id: 1,
            name: "Alice".to_string(),
        };
        service.register(&alice).await.unwrap();

        let created = service.provision_known_principals().await.unwrap();
        assert_eq!(created, 1);

        let again = service.provision_known_principals().await.unwrap();
        assert_eq!(again, 0);
    }
}

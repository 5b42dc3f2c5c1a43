//! In-memory OAuth storage implementation
//!
//! This module provides in-memory implementations for OAuth-related storage traits.

use crate::errors::StorageError;
use crate::oauth::types::*;
use crate::storage::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

pub type Result<T> = std::result::Result<T, StorageError>;

/// In-memory implementation for OAuth storage
#[derive(Default)]
pub struct MemoryOAuthStorage {
    principals: Mutex<HashMap<i64, Principal>>,
    clients: Mutex<HashMap<String, Client>>,
    auth_codes: Mutex<HashMap<String, AuthorizationCode>>,
    access_tokens: Mutex<HashMap<String, AccessTokenRecord>>, // token_hash -> record
}

impl MemoryOAuthStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for MemoryOAuthStorage {
    async fn store_principal(&self, principal: &Principal) -> Result<()> {
        let mut principals = self
            .principals
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn get_principal(&self, principal_id: i64) -> Result<Option<Principal>> {
        let principals = self
            .principals
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        Ok(principals.get(&principal_id).cloned())
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let principals = self
            .principals
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        let mut all: Vec<_> = principals.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }
}

#[async_trait]
impl ClientStore for MemoryOAuthStorage {
    async fn store_client(&self, client: &Client) -> Result<()> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        clients.insert(client.client_id.clone(), client.clone());
        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        Ok(clients.get(client_id).cloned())
    }

    async fn get_client_for_principal(&self, principal_id: i64) -> Result<Option<Client>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        Ok(clients
            .values()
            .find(|c| c.principal_id == principal_id)
            .cloned())
    }
}

#[async_trait]
impl AuthorizationCodeStore for MemoryOAuthStorage {
    async fn store_code(&self, code: &AuthorizationCode) -> Result<()> {
        let mut codes = self
            .auth_codes
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        codes.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn consume_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>> {
        // The existence, expiry, and used checks all happen under a single
        // lock acquisition, so two concurrent redemptions cannot both win.
        let mut codes = self
            .auth_codes
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;

        match codes.get_mut(code) {
            Some(auth_code) if !auth_code.used && auth_code.expires_at > now => {
                auth_code.used = true;
                Ok(Some(auth_code.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cleanup_expired_codes(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut codes = self
            .auth_codes
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        let before = codes.len();
        codes.retain(|_, c| c.expires_at > now);
        Ok(before - codes.len())
    }
}

#[async_trait]
impl AccessTokenStore for MemoryOAuthStorage {
    async fn store_token(&self, token: &AccessTokenRecord) -> Result<()> {
        let mut tokens = self
            .access_tokens
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>> {
        let tokens = self
            .access_tokens
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn revoke_token_by_hash(&self, token_hash: &str) -> Result<()> {
        let mut tokens = self
            .access_tokens
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        if let Some(record) = tokens.get_mut(token_hash) {
            record.revoked = true;
        }
        Ok(())
    }

    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tokens = self
            .access_tokens
            .lock()
            .map_err(|e| StorageError::InvalidData(format!("Lock error: {}", e)))?;
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at > now);
        Ok(before - tokens.len())
    }
}

impl OAuthStorage for MemoryOAuthStorage {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_code(code: &str, expires_at: DateTime<Utc>) -> AuthorizationCode {
        AuthorizationCode {
            code: code.to_string(),
            client_id: "test-client".to_string(),
            principal_id: 1,
            redirect_uri: "https://example.com/callback".to_string(),
            scope: "read:tools".to_string(),
            created_at: Utc::now(),
            expires_at,
            used: false,
        }
    }

    #[tokio::test]
    async fn test_authorization_code_lifecycle() {
        let storage = MemoryOAuthStorage::new();
        let code = sample_code("test-code", Utc::now() + Duration::minutes(10));

        // Store code
        storage.store_code(&code).await.unwrap();

        // Consume code (should work first time)
        let consumed = storage
            .consume_code("test-code", Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert!(consumed.used);
        assert_eq!(consumed.principal_id, 1);

        // Try to consume again (should fail)
        let consumed_again = storage.consume_code("test-code", Utc::now()).await.unwrap();
        assert!(consumed_again.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_not_consumable() {
        let storage = MemoryOAuthStorage::new();
        let code = sample_code("stale-code", Utc::now() - Duration::seconds(1));

        storage.store_code(&code).await.unwrap();

        let consumed = storage.consume_code("stale-code", Utc::now()).await.unwrap();
        assert!(consumed.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_code_redemption_single_winner() {
        use std::sync::Arc;

        let storage = Arc::new(MemoryOAuthStorage::new());
        let code = sample_code("race-code", Utc::now() + Duration::minutes(10));
        storage.store_code(&code).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.consume_code("race-code", Utc::now()).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_token_record_revocation() {
        let storage = MemoryOAuthStorage::new();

        let record = AccessTokenRecord {
            token_hash: "abc123".to_string(),
            client_id: "test-client".to_string(),
            principal_id: 1,
            scope: "read:tools".to_string(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::minutes(30),
            revoked: false,
        };

        storage.store_token(&record).await.unwrap();

        let stored = storage.get_token_by_hash("abc123").await.unwrap().unwrap();
        assert!(!stored.revoked);

        storage.revoke_token_by_hash("abc123").await.unwrap();
        let revoked = storage.get_token_by_hash("abc123").await.unwrap().unwrap();
        assert!(revoked.revoked);

        // Revoking an unknown hash is a no-op
        storage.revoke_token_by_hash("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let storage = MemoryOAuthStorage::new();

        storage
            .store_code(&sample_code("live", Utc::now() + Duration::minutes(5)))
            .await
            .unwrap();
        storage
            .store_code(&sample_code("dead", Utc::now() - Duration::minutes(5)))
            .await
            .unwrap();

        let removed = storage.cleanup_expired_codes(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(
            storage
                .consume_code("live", Utc::now())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_client_lookup_by_principal() {
        let storage = MemoryOAuthStorage::new();

        let client = Client {
            client_id: "toolgate-user-7".to_string(),
            secret_hash: "$2b$04$hash".to_string(),
            client_name: "Alice's Agent".to_string(),
            redirect_uris: vec!["https://example.com/callback".to_string()],
            grant_types: vec![GrantType::AuthorizationCode, GrantType::ClientCredentials],
            principal_id: 7,
            created_at: Utc::now(),
        };
        storage.store_client(&client).await.unwrap();

        let found = storage.get_client_for_principal(7).await.unwrap().unwrap();
        assert_eq!(found.client_id, "toolgate-user-7");
        assert!(storage.get_client_for_principal(8).await.unwrap().is_none());
    }
}

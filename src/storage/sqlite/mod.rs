//! SQLite storage implementations
//!
//! This module provides SQLite-based implementations of all storage traits.
//! SQLite is suitable for single-instance deployments and development.

mod access_tokens;
mod authorization_codes;
mod oauth_clients;
mod principals;

use crate::errors::StorageError;
use crate::oauth::types::{AccessTokenRecord, AuthorizationCode, Client, Principal};
use crate::storage::traits::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

pub use access_tokens::SqliteAccessTokenStore;
pub use authorization_codes::SqliteAuthorizationCodeStore;
pub use oauth_clients::SqliteClientStore;
pub use principals::SqlitePrincipalStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Comprehensive SQLite OAuth storage implementation
pub struct SqliteOAuthStorage {
    pool: SqlitePool,
    principal_store: Arc<SqlitePrincipalStore>,
    client_store: Arc<SqliteClientStore>,
    authorization_code_store: Arc<SqliteAuthorizationCodeStore>,
    access_token_store: Arc<SqliteAccessTokenStore>,
}

impl SqliteOAuthStorage {
    /// Create a new SQLite OAuth storage instance
    pub fn new(pool: SqlitePool) -> Self {
        let principal_store = Arc::new(SqlitePrincipalStore::new(pool.clone()));
        let client_store = Arc::new(SqliteClientStore::new(pool.clone()));
        let authorization_code_store = Arc::new(SqliteAuthorizationCodeStore::new(pool.clone()));
        let access_token_store = Arc::new(SqliteAccessTokenStore::new(pool.clone()));

        Self {
            pool,
            principal_store,
            client_store,
            authorization_code_store,
            access_token_store,
        }
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for SqliteOAuthStorage {
    async fn store_principal(&self, principal: &Principal) -> Result<()> {
        self.principal_store.store_principal(principal).await
    }

    async fn get_principal(&self, principal_id: i64) -> Result<Option<Principal>> {
        self.principal_store.get_principal(principal_id).await
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        self.principal_store.list_principals().await
    }
}

#[async_trait]
impl ClientStore for SqliteOAuthStorage {
    async fn store_client(&self, client: &Client) -> Result<()> {
        self.client_store.store_client(client).await
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        self.client_store.get_client(client_id).await
    }

    async fn get_client_for_principal(&self, principal_id: i64) -> Result<Option<Client>> {
        self.client_store.get_client_for_principal(principal_id).await
    }
}

#[async_trait]
impl AuthorizationCodeStore for SqliteOAuthStorage {
    async fn store_code(&self, code: &AuthorizationCode) -> Result<()> {
        self.authorization_code_store.store_code(code).await
    }

    async fn consume_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AuthorizationCode>> {
        self.authorization_code_store.consume_code(code, now).await
    }

    async fn cleanup_expired_codes(&self, now: DateTime<Utc>) -> Result<usize> {
        self.authorization_code_store.cleanup_expired_codes(now).await
    }
}

#[async_trait]
impl AccessTokenStore for SqliteOAuthStorage {
    async fn store_token(&self, token: &AccessTokenRecord) -> Result<()> {
        self.access_token_store.store_token(token).await
    }

    async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>> {
        self.access_token_store.get_token_by_hash(token_hash).await
    }

    async fn revoke_token_by_hash(&self, token_hash: &str) -> Result<()> {
        self.access_token_store.revoke_token_by_hash(token_hash).await
    }

    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        self.access_token_store.cleanup_expired_tokens(now).await
    }
}

impl OAuthStorage for SqliteOAuthStorage {}

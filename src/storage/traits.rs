//! Storage trait definitions for OAuth data.
//!
//! Defines async storage interfaces for principals, clients, authorization
//! codes, and access token records that can be implemented by various
//! backend providers.

use crate::errors::StorageError;
use crate::oauth::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for storing and retrieving principals
#[async_trait]
pub trait PrincipalStore {
    /// Store a new principal
    async fn store_principal(&self, principal: &Principal) -> Result<()>;

    /// Retrieve a principal by ID
    async fn get_principal(&self, principal_id: i64) -> Result<Option<Principal>>;

    /// List all principals
    async fn list_principals(&self) -> Result<Vec<Principal>>;
}

/// Trait for storing and retrieving OAuth clients
#[async_trait]
pub trait ClientStore {
    /// Store a new OAuth client
    async fn store_client(&self, client: &Client) -> Result<()>;

    /// Retrieve a client by ID
    async fn get_client(&self, client_id: &str) -> Result<Option<Client>>;

    /// Retrieve the client owned by a principal, if any
    async fn get_client_for_principal(&self, principal_id: i64) -> Result<Option<Client>>;
}

/// Trait for storing and redeeming authorization codes
#[async_trait]
pub trait AuthorizationCodeStore {
    /// Store a new authorization code
    async fn store_code(&self, code: &AuthorizationCode) -> Result<()>;

    /// Atomically redeem an authorization code.
    ///
    /// Returns the code record only if it exists, is unexpired, and has not
    /// been redeemed before; the unused-to-used transition happens in the
    /// same operation, so concurrent redemptions of the same code yield at
    /// most one `Some`.
    async fn consume_code(&self, code: &str, now: DateTime<Utc>) -> Result<Option<AuthorizationCode>>;

    /// Clean up expired codes
    async fn cleanup_expired_codes(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Trait for storing and retrieving access token records
#[async_trait]
pub trait AccessTokenStore {
    /// Store a new access token record
    async fn store_token(&self, token: &AccessTokenRecord) -> Result<()>;

    /// Retrieve a token record by its hash
    async fn get_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>>;

    /// Mark a token record revoked by its hash
    async fn revoke_token_by_hash(&self, token_hash: &str) -> Result<()>;

    /// Clean up expired token records
    async fn cleanup_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Combined OAuth storage trait
pub trait OAuthStorage:
    PrincipalStore + ClientStore + AuthorizationCodeStore + AccessTokenStore + Send + Sync
{
}

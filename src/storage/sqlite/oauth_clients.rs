//! SQLite implementation for OAuth client storage

use crate::errors::StorageError;
use crate::oauth::types::{Client, GrantType};
use crate::storage::traits::{ClientStore, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of OAuth client storage
pub struct SqliteClientStore {
    pool: SqlitePool,
}

impl SqliteClientStore {
    /// Create a new SQLite client store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn grant_types_to_json(grant_types: &[GrantType]) -> Result<String> {
        serde_json::to_string(grant_types)
            .map_err(|e| StorageError::InvalidData(format!("Invalid grant_types: {}", e)))
    }

    fn grant_types_from_json(json: &str) -> Result<Vec<GrantType>> {
        serde_json::from_str(json)
            .map_err(|e| StorageError::InvalidData(format!("Invalid grant_types JSON: {}", e)))
    }

    fn row_to_client(row: &SqliteRow) -> Result<Client> {
        let redirect_uris_json: String = row.try_get("redirect_uris").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get redirect_uris: {}", e))
        })?;
        let redirect_uris: Vec<String> = serde_json::from_str(&redirect_uris_json)
            .map_err(|e| StorageError::InvalidData(format!("Invalid redirect_uris JSON: {}", e)))?;

        let grant_types_json: String = row.try_get("grant_types").map_err(|e| {
            StorageError::DatabaseError(format!("Failed to get grant_types: {}", e))
        })?;
        let grant_types = Self::grant_types_from_json(&grant_types_json)?;

        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StorageError::DatabaseError(format!("Failed to get created_at: {}", e)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid created_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Client {
            client_id: row.try_get("client_id").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get client_id: {}", e))
            })?,
            secret_hash: row.try_get("secret_hash").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get secret_hash: {}", e))
            })?,
            client_name: row.try_get("client_name").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get client_name: {}", e))
            })?,
            redirect_uris,
            grant_types,
            principal_id: row.try_get("principal_id").map_err(|e| {
                StorageError::DatabaseError(format!("Failed to get principal_id: {}", e))
            })?,
            created_at,
        })
    }
}

#[async_trait]
impl ClientStore for SqliteClientStore {
    async fn store_client(&self, client: &Client) -> Result<()> {
        let redirect_uris_json = serde_json::to_string(&client.redirect_uris)
            .map_err(|e| StorageError::InvalidData(format!("Invalid redirect_uris: {}", e)))?;
        let grant_types_json = Self::grant_types_to_json(&client.grant_types)?;

        sqlx::query(
            r#"
            INSERT INTO oauth_clients (
                client_id, secret_hash, client_name, redirect_uris,
                grant_types, principal_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.client_id)
        .bind(&client.secret_hash)
        .bind(&client.client_name)
        .bind(redirect_uris_json)
        .bind(grant_types_json)
        .bind(client.principal_id)
        .bind(client.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn get_client(&self, client_id: &str) -> Result<Option<Client>> {
        let row = sqlx::query("SELECT * FROM oauth_clients WHERE client_id = ?")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_client(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_client_for_principal(&self, principal_id: i64) -> Result<Option<Client>> {
        let row = sqlx::query("SELECT * FROM oauth_clients WHERE principal_id = ?")
            .bind(principal_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_client(&row)?)),
            None => Ok(None),
        }
    }
}

//! SQLite implementation for principal storage

use crate::errors::StorageError;
use crate::oauth::types::Principal;
use crate::storage::traits::{PrincipalStore, Result};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

/// SQLite implementation of principal storage
pub struct SqlitePrincipalStore {
    pool: SqlitePool,
}

impl SqlitePrincipalStore {
    /// Create a new SQLite principal store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_principal(row: &SqliteRow) -> Result<Principal> {
        Ok(Principal {
            id: row
                .try_get("id")
                .map_err(|e| StorageError::DatabaseError(format!("Failed to get id: {}", e)))?,
            name: row
                .try_get("name")
                .map_err(|e| StorageError::DatabaseError(format!("Failed to get name: {}", e)))?,
        })
    }
}

#[async_trait]
impl PrincipalStore for SqlitePrincipalStore {
    async fn store_principal(&self, principal: &Principal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO principals (id, name) VALUES (?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(principal.id)
        .bind(&principal.name)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn get_principal(&self, principal_id: i64) -> Result<Option<Principal>> {
        let row = sqlx::query("SELECT * FROM principals WHERE id = ?")
            .bind(principal_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_principal(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        let rows = sqlx::query("SELECT * FROM principals ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        let mut principals = Vec::new();
        for row in rows {
            principals.push(Self::row_to_principal(&row)?);
        }
        Ok(principals)
    }
}

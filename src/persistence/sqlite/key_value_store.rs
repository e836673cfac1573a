//! Implementation of the KeyValueStore trait for SqliteStateRepository

use async_trait::async_trait;

use crate::persistence::{
    error::PersistenceError, sqlite::SqliteStateRepository, traits::KeyValueStore,
};

#[async_trait]
impl KeyValueStore for SqliteStateRepository {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        tracing::debug!(key, "Attempting to retrieve state value.");

        let row: Option<(String,)> = self
            .execute_query_with_error_handling(
                "get state value",
                sqlx::query_as::<_, (String,)>("SELECT value FROM application_state WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|(value,)| value))
    }

    #[tracing::instrument(skip(self, value), level = "debug")]
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        tracing::debug!(key, bytes = value.len(), "Attempting to set state value.");

        self.execute_query_with_error_handling(
            "set state value",
            sqlx::query(
                r#"
                INSERT INTO application_state (key, value, updated_at)
                VALUES (?, ?, CURRENT_TIMESTAMP)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        self.execute_query_with_error_handling(
            "delete state value",
            sqlx::query("DELETE FROM application_state WHERE key = ?").bind(key).execute(&self.pool),
        )
        .await?;

        Ok(())
    }
}

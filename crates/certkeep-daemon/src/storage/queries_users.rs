//! User preference queries.

use certkeep_core::db::{DatabaseError, unix_timestamp};

use super::db::Database;

/// Language assumed for users who never picked one.
pub const DEFAULT_LANGUAGE: &str = "ua";

impl Database {
    /// Register a user on first interaction. Idempotent.
    pub async fn ensure_user(&self, telegram_id: i64) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT OR IGNORE INTO users (telegram_id, language, created_at, updated_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(telegram_id)
        .bind(DEFAULT_LANGUAGE)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Set a user's interface language, creating the user row if needed.
    pub async fn set_user_language(
        &self,
        telegram_id: i64,
        language: &str,
    ) -> Result<(), DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (telegram_id, language, created_at, updated_at) \
             VALUES (?, ?, ?, ?) \
             ON CONFLICT(telegram_id) DO UPDATE SET language = ?, updated_at = ?",
        )
        .bind(telegram_id)
        .bind(language)
        .bind(now)
        .bind(now)
        .bind(language)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// The user's chosen language, or the default when unknown.
    pub async fn get_user_language(&self, telegram_id: i64) -> Result<String, DatabaseError> {
        let language: Option<String> =
            sqlx::query_scalar("SELECT language FROM users WHERE telegram_id = ?")
                .bind(telegram_id)
                .fetch_optional(self.pool())
                .await?;

        Ok(language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
    }

    /// Every known user id (for broadcast messages).
    pub async fn all_user_ids(&self) -> Result<Vec<i64>, DatabaseError> {
        let ids =
            sqlx::query_scalar::<_, i64>("SELECT telegram_id FROM users ORDER BY telegram_id ASC")
                .fetch_all(self.pool())
                .await?;

        Ok(ids)
    }
}

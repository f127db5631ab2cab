//! Shared-access grant queries.
//!
//! A grant row `(owner_id, viewer_id)` lets the viewer read the owner's
//! certificates. Owners never get a row for themselves; self-access is
//! implicit in `can_view`.

use certkeep_core::db::{DatabaseError, unix_timestamp};

use super::db::Database;

impl Database {
    /// Grant `viewer_id` read access to `owner_id`'s certificates.
    ///
    /// Idempotent; a repeated grant changes nothing, and self-grants are
    /// silently ignored. Returns `true` when a new grant row was created.
    pub async fn grant_access(&self, owner_id: i64, viewer_id: i64) -> Result<bool, DatabaseError> {
        if owner_id == viewer_id {
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO shared_access (owner_id, viewer_id, granted_at) \
             VALUES (?, ?, ?)",
        )
        .bind(owner_id)
        .bind(viewer_id)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke a grant. Idempotent; returns `true` when a grant existed.
    pub async fn revoke_access(
        &self,
        owner_id: i64,
        viewer_id: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM shared_access WHERE owner_id = ? AND viewer_id = ?")
            .bind(owner_id)
            .bind(viewer_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All users the owner currently shares with.
    pub async fn list_viewers(&self, owner_id: i64) -> Result<Vec<i64>, DatabaseError> {
        let viewers = sqlx::query_scalar::<_, i64>(
            "SELECT viewer_id FROM shared_access WHERE owner_id = ? ORDER BY viewer_id ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(viewers)
    }

    /// Whether `viewer_id` may read `owner_id`'s certificates. Always true
    /// for the owner themselves.
    pub async fn can_view(&self, owner_id: i64, viewer_id: i64) -> Result<bool, DatabaseError> {
        if owner_id == viewer_id {
            return Ok(true);
        }

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM shared_access WHERE owner_id = ? AND viewer_id = ?")
                .bind(owner_id)
                .bind(viewer_id)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.is_some())
    }
}

//! Certificate queries: replace-on-upload insert, owner views, expiry scans.

use chrono::NaiveDate;
use tracing::debug;

use certkeep_core::db::{DatabaseError, unix_timestamp};
use certkeep_core::time::utc_day_bounds;
use certkeep_x509::ParsedCertificate;

use super::db::Database;
use super::models::{CertificateRow, CertificateSummary, ExpiringCertificate};

impl Database {
    /// Store a certificate for `owner_id`, replacing any previous record the
    /// owner holds for the same organization.
    ///
    /// The delete and the insert run in one transaction: when the insert hits
    /// the global fingerprint uniqueness constraint, the whole unit rolls
    /// back, so a duplicate upload can never delete the record it collided
    /// with. Returns `false` for such duplicates, `true` when a row was
    /// created.
    pub async fn insert_certificate(
        &self,
        cert: &ParsedCertificate,
        owner_id: i64,
        filename: &str,
    ) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM certificates WHERE owner_id = ? AND organization = ?")
            .bind(owner_id)
            .bind(&cert.organization)
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            "INSERT INTO certificates \
             (owner_id, organization, director, tax_id, registry_id, \
              valid_from, valid_to, fingerprint, filename, uploaded_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(owner_id)
        .bind(&cert.organization)
        .bind(&cert.director)
        .bind(&cert.tax_id)
        .bind(&cert.registry_id)
        .bind(cert.valid_from)
        .bind(cert.valid_to)
        .bind(&cert.fingerprint)
        .bind(filename)
        .bind(now)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(
                    owner_id,
                    fingerprint = %cert.fingerprint,
                    "Duplicate certificate fingerprint; insert rolled back"
                );
                tx.rollback().await?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The owner's certificates, soonest-expiring first. Ties on `valid_to`
    /// keep insertion order.
    pub async fn list_for_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<CertificateSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, CertificateSummary>(
            "SELECT organization, director, valid_to FROM certificates \
             WHERE owner_id = ? ORDER BY valid_to ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Case-insensitive substring search over one owner's organizations.
    ///
    /// The match runs in Rust rather than SQL `LIKE`: SQLite only folds
    /// ASCII case and the stored names are mostly Cyrillic.
    pub async fn search_by_organization(
        &self,
        owner_id: i64,
        needle: &str,
    ) -> Result<Vec<CertificateRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CertificateRow>(
            "SELECT * FROM certificates WHERE owner_id = ? ORDER BY valid_to ASC, id ASC",
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        let needle = needle.to_lowercase();
        Ok(rows
            .into_iter()
            .filter(|row| row.organization.to_lowercase().contains(&needle))
            .collect())
    }

    /// Delete every certificate whose validity ended before `as_of` (unix
    /// seconds). Returns the number of rows removed.
    pub async fn delete_expired(&self, as_of: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM certificates WHERE valid_to < ?")
            .bind(as_of)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Certificates whose `valid_to` falls on the given UTC calendar day,
    /// whatever their stored time-of-day.
    pub async fn find_expiring(
        &self,
        day: NaiveDate,
    ) -> Result<Vec<ExpiringCertificate>, DatabaseError> {
        let (start, end) = utc_day_bounds(day);

        let rows = sqlx::query_as::<_, ExpiringCertificate>(
            "SELECT owner_id, organization, director, valid_to FROM certificates \
             WHERE valid_to >= ? AND valid_to < ? ORDER BY id ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Look up a certificate by its content fingerprint.
    pub async fn certificate_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<CertificateRow>, DatabaseError> {
        let cert =
            sqlx::query_as::<_, CertificateRow>("SELECT * FROM certificates WHERE fingerprint = ?")
                .bind(fingerprint)
                .fetch_optional(self.pool())
                .await?;

        Ok(cert)
    }

    /// Certificates other owners shared with `viewer_id`, reduced to the
    /// cross-user projection.
    pub async fn list_shared_with(
        &self,
        viewer_id: i64,
    ) -> Result<Vec<CertificateSummary>, DatabaseError> {
        let rows = sqlx::query_as::<_, CertificateSummary>(
            "SELECT organization, director, valid_to FROM certificates \
             WHERE owner_id IN (SELECT owner_id FROM shared_access WHERE viewer_id = ?) \
             AND owner_id != ? \
             ORDER BY valid_to ASC, id ASC",
        )
        .bind(viewer_id)
        .bind(viewer_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}

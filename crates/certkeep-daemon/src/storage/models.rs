//! Row types for certkeep storage.

use serde::{Deserialize, Serialize};

/// Full stored certificate record. Only ever shown to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CertificateRow {
    pub id: i64,
    pub owner_id: i64,
    pub organization: String,
    pub director: String,
    pub tax_id: String,
    pub registry_id: String,
    pub valid_from: i64,
    pub valid_to: i64,
    pub fingerprint: String,
    pub filename: String,
    pub uploaded_at: i64,
}

/// Reduced projection safe to show across user boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CertificateSummary {
    pub organization: String,
    pub director: String,
    pub valid_to: i64,
}

/// One certificate hitting an expiry threshold, addressed to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExpiringCertificate {
    pub owner_id: i64,
    pub organization: String,
    pub director: String,
    pub valid_to: i64,
}

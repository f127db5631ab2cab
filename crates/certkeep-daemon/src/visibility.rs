//! Access-controlled views over stored certificates.
//!
//! A viewer always sees their own certificates. Someone else's certificates
//! are visible only while a matching grant exists, and then only as the
//! reduced summary (organization, director, expiry). Registry and tax
//! identifiers never cross the ownership boundary.

use thiserror::Error;

use crate::storage::{CertificateSummary, Database, DatabaseError};

#[derive(Error, Debug)]
pub enum VisibilityError {
    #[error("user {viewer_id} has no access to certificates owned by {owner_id}")]
    AccessDenied { owner_id: i64, viewer_id: i64 },
    #[error("database error: {0}")]
    Database(String),
}

impl From<DatabaseError> for VisibilityError {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Everything a viewer is allowed to see, split by provenance.
#[derive(Debug, Default)]
pub struct VisibleCertificates {
    /// The viewer's own certificates.
    pub own: Vec<CertificateSummary>,
    /// Certificates shared with the viewer by other owners.
    pub shared: Vec<CertificateSummary>,
}

pub struct VisibilityResolver {
    db: Database,
}

impl VisibilityResolver {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Collect every certificate the viewer may see right now.
    pub async fn certificates_visible_to(
        &self,
        viewer_id: i64,
    ) -> Result<VisibleCertificates, DatabaseError> {
        let own = self.db.list_for_owner(viewer_id).await?;
        let shared = self.db.list_shared_with(viewer_id).await?;

        Ok(VisibleCertificates { own, shared })
    }

    /// List one specific owner's certificates on behalf of a requester.
    ///
    /// Fails with [`VisibilityError::AccessDenied`] unless the requester is the
    /// owner or holds a grant from them.
    pub async fn certificates_for(
        &self,
        owner_id: i64,
        requested_by: i64,
    ) -> Result<Vec<CertificateSummary>, VisibilityError> {
        if !self.db.can_view(owner_id, requested_by).await? {
            return Err(VisibilityError::AccessDenied {
                owner_id,
                viewer_id: requested_by,
            });
        }

        Ok(self.db.list_for_owner(owner_id).await?)
    }
}

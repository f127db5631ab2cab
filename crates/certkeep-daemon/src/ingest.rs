//! Certificate ingestion: single files and unpacked archives.
//!
//! Every file is handled on its own. A file that fails to parse or is
//! rejected by the store is recorded in the report and never aborts the rest
//! of the batch. Only a broken archive container aborts the whole upload.

use thiserror::Error;
use tracing::{debug, warn};

use certkeep_x509::{ParseError, parse_certificate};

use crate::storage::{Database, DatabaseError};

/// File extensions treated as certificate material inside an archive.
const CERTIFICATE_EXTENSIONS: [&str; 3] = [".cer", ".crt", ".pem"];

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("bad archive: {0}")]
    BadArchive(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{0}")]
    Malformed(String),
    #[error("certificate is missing organization or fingerprint")]
    Incomplete,
    #[error("database error: {0}")]
    Database(String),
}

impl From<ParseError> for IngestError {
    fn from(err: ParseError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<DatabaseError> for IngestError {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}

/// One file pulled out of an uploaded archive.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Unpacks an uploaded archive into its member files.
pub trait ArchiveExtractor {
    fn extract(&self, archive: &[u8]) -> Result<Vec<ExtractedFile>, ArchiveError>;
}

/// What happened to a single ingested file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Stored as a new row or as a replacement for the owner's previous
    /// certificate of the same organization.
    Added,
    /// Identical content already exists somewhere in the store.
    Skipped,
    Failed(IngestError),
}

#[derive(Debug)]
pub struct FileReport {
    pub filename: String,
    pub outcome: FileOutcome,
}

/// Aggregate result of a batch upload.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    pub files: Vec<FileReport>,
}

impl IngestReport {
    fn record(&mut self, filename: &str, outcome: FileOutcome) {
        match &outcome {
            FileOutcome::Added => self.added += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Failed(_) => self.failed += 1,
        }

        self.files.push(FileReport {
            filename: filename.to_string(),
            outcome,
        });
    }
}

/// Whether a filename looks like certificate material.
pub fn is_certificate_file(name: &str) -> bool {
    let name = name.to_lowercase();
    CERTIFICATE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Parse one file and store it for the owner.
pub async fn ingest_file(
    db: &Database,
    owner_id: i64,
    filename: &str,
    bytes: &[u8],
) -> FileOutcome {
    let parsed = match parse_certificate(bytes) {
        Ok(parsed) => parsed,
        Err(err) => return FileOutcome::Failed(err.into()),
    };

    if parsed.organization.is_empty() || parsed.fingerprint.is_empty() {
        return FileOutcome::Failed(IngestError::Incomplete);
    }

    match db.insert_certificate(&parsed, owner_id, filename).await {
        Ok(true) => {
            debug!(owner_id, organization = %parsed.organization, "Certificate stored");
            FileOutcome::Added
        }
        Ok(false) => {
            debug!(owner_id, organization = %parsed.organization, "Certificate already known, skipped");
            FileOutcome::Skipped
        }
        Err(err) => FileOutcome::Failed(err.into()),
    }
}

/// Ingest a batch of files, one report entry per file.
pub async fn ingest_files(db: &Database, owner_id: i64, files: &[ExtractedFile]) -> IngestReport {
    let mut report = IngestReport::default();

    for file in files {
        let outcome = ingest_file(db, owner_id, &file.filename, &file.bytes).await;
        if let FileOutcome::Failed(err) = &outcome {
            warn!(owner_id, filename = %file.filename, error = %err, "Certificate file rejected");
        }
        report.record(&file.filename, outcome);
    }

    report
}

/// Unpack an archive and ingest every certificate file in it.
///
/// Non-certificate members are ignored. A container the extractor cannot
/// read aborts the upload with [`ArchiveError::BadArchive`].
pub async fn ingest_archive(
    db: &Database,
    owner_id: i64,
    extractor: &dyn ArchiveExtractor,
    archive: &[u8],
) -> Result<IngestReport, ArchiveError> {
    let files: Vec<ExtractedFile> = extractor
        .extract(archive)?
        .into_iter()
        .filter(|file| is_certificate_file(&file.filename))
        .collect();

    Ok(ingest_files(db, owner_id, &files).await)
}

// certificate-generation-service/src/delivery.rs

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

use crate::error::{CertificateError, Result};
use crate::models::SavedCertificate;
use crate::renderers::PackagedPdf;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// The file-save mechanism: finished documents land in a download directory.
/// Files are written to a temporary name first so a document only ever
/// appears under its final name fully written.
#[derive(Clone)]
pub struct DownloadSink {
    directory: PathBuf,
}

impl DownloadSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[instrument(skip(self, pdf), fields(directory = %self.directory.display()))]
    pub fn save(
        &self,
        file_name: &str,
        pdf: &PackagedPdf,
        rendering_duration_ms: i32,
    ) -> Result<SavedCertificate> {
        fs::create_dir_all(&self.directory)?;

        let mut hasher = Sha256::new();
        hasher.update(&pdf.bytes);
        let sha256_checksum = hex::encode(hasher.finalize());

        let mut tmp = NamedTempFile::new_in(&self.directory)?;
        tmp.write_all(&pdf.bytes)?;
        tmp.flush()?;

        let path = self.directory.join(file_name);
        tmp.persist(&path)
            .map_err(|e| CertificateError::IoError(e.error))?;

        info!(
            file_name,
            size_bytes = pdf.bytes.len(),
            checksum = %sha256_checksum,
            "Certificate saved"
        );

        Ok(SavedCertificate {
            file_name: file_name.to_string(),
            path: path.display().to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            size_bytes: pdf.bytes.len() as i64,
            sha256_checksum,
            page_width_pt: pdf.page_width_pt,
            page_height_pt: pdf.page_height_pt,
            rendering_duration_ms,
        })
    }
}

//! Client-side checks run before a certificate is sent to the portal.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use pem::Pem;
use sha2::{Digest, Sha256};
use thiserror::Error;
use x509_parser::prelude::{FromDer, X509Certificate};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("certificate name is required")]
    EmptyName,
    #[error("a certificate named {0} already exists")]
    DuplicateName(String),
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("failed to read certificate file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Name and PEM payload entered in the upload form.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub name: String,
    pub content: String,
}

impl UploadForm {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self, UploadError> {
        let content = fs::read_to_string(path).map_err(|source| UploadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(name, content))
    }
}

/// Summary of the leaf certificate in a PEM payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub fingerprint: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateSummary {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }
}

/// A form that passed validation, ready to upload.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub name: String,
    pub content: String,
    pub summary: CertificateSummary,
}

/// Checks the form against the names already in use and parses the payload.
pub fn validate_upload(
    form: &UploadForm,
    existing_names: &[String],
) -> Result<ValidatedUpload, UploadError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(UploadError::EmptyName);
    }
    if existing_names.iter().any(|existing| existing == name) {
        return Err(UploadError::DuplicateName(name.to_string()));
    }
    let summary = inspect_certificate(&form.content)?;
    Ok(ValidatedUpload {
        name: name.to_string(),
        content: form.content.clone(),
        summary,
    })
}

/// Parses the first `CERTIFICATE` block of a PEM payload.
pub fn inspect_certificate(content: &str) -> Result<CertificateSummary, UploadError> {
    let blocks = pem::parse_many(content)
        .map_err(|err| UploadError::InvalidCertificate(format!("malformed PEM: {err}")))?;
    let leaf: Pem = blocks
        .into_iter()
        .find(|block| block.tag() == "CERTIFICATE")
        .ok_or_else(|| UploadError::InvalidCertificate("no certificate PEM block found".into()))?;

    let (_, cert) = X509Certificate::from_der(leaf.contents())
        .map_err(|err| UploadError::InvalidCertificate(err.to_string()))?;

    let fingerprint = {
        let mut hasher = Sha256::new();
        hasher.update(leaf.contents());
        hex::encode(hasher.finalize())
    };

    Ok(CertificateSummary {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        fingerprint,
        not_before: to_utc(cert.validity().not_before.timestamp()),
        not_after: to_utc(cert.validity().not_after.timestamp()),
    })
}

fn to_utc(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

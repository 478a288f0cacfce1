use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag partitioning an application's certificates by deployment environment.
/// The portal uses `PRODUCTION` and `SANDBOX`, but the value is treated as
/// opaque and compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyType(String);

impl KeyType {
    pub const PRODUCTION: &'static str = "PRODUCTION";
    pub const SANDBOX: &'static str = "SANDBOX";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn production() -> Self {
        Self::new(Self::PRODUCTION)
    }

    pub fn sandbox() -> Self {
        Self::new(Self::SANDBOX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A client certificate attached to an application, as returned by the portal.
/// Certificates are immutable once uploaded; identity is the UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "UUID")]
    pub uuid: String,
    /// Display label, unique per application and key type.
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    /// PEM payload; the list endpoint may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Body of the certificate list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidity {
    pub from: String,
    pub to: String,
}

/// Descriptive fields fetched on demand for a single certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDetails {
    pub status: String,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<CertificateValidity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// API-consumer registration that certificates are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
    pub name: String,
    pub throttling_policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// The application as currently edited, plus the snapshot taken before the
/// edit started. Only the revert-and-save action reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSnapshot {
    pub current: Application,
    pub previous: Option<Application>,
}

impl ApplicationSnapshot {
    pub fn new(current: Application) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    pub fn with_previous(current: Application, previous: Application) -> Self {
        Self {
            current,
            previous: Some(previous),
        }
    }
}

/// Optional request modifiers for an application update.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Entity tag for optimistic concurrency, sent as `If-Match`.
    pub if_match: Option<String>,
}

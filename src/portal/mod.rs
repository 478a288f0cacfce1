//! Developer portal REST API surface consumed by the certificate views.

pub mod http;
pub mod memory;
pub mod rest;

pub use memory::InMemoryPortal;
pub use rest::RestPortalClient;

use crate::core::error::ApiError;
use crate::core::types::{
    Application, Certificate, CertificateCollection, CertificateDetails, KeyType, UpdateOptions,
};

/// Certificate CRUD and application update operations of the portal.
/// Calls block until the portal answers; callers must not hold view state
/// locks across them.
pub trait DevPortalApi: Send + Sync {
    /// Lists every client certificate attached to the application.
    fn list_client_certificates(
        &self,
        application_id: &str,
    ) -> Result<CertificateCollection, ApiError>;

    /// Fetches the descriptive fields of a single certificate.
    fn get_client_certificate(
        &self,
        application_id: &str,
        uuid: &str,
    ) -> Result<CertificateDetails, ApiError>;

    /// Uploads a PEM certificate and returns the stored record.
    fn add_client_certificate(
        &self,
        application_id: &str,
        content: &str,
        name: &str,
        key_type: &KeyType,
    ) -> Result<Certificate, ApiError>;

    fn delete_client_certificate(&self, application_id: &str, uuid: &str)
    -> Result<(), ApiError>;

    /// Persists the application and returns the portal's copy.
    fn update_application(
        &self,
        application: &Application,
        options: Option<&UpdateOptions>,
    ) -> Result<Application, ApiError>;
}

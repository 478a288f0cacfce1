use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use super::DevPortalApi;
use crate::certificates::upload::inspect_certificate;
use crate::core::error::ApiError;
use crate::core::types::{
    Application, Certificate, CertificateCollection, CertificateDetails, CertificateValidity,
    KeyType, UpdateOptions,
};

const STATUS_ACTIVE: &str = "Active";
const STATUS_EXPIRED: &str = "Expired";
const STATUS_UNKNOWN: &str = "Unknown";

#[derive(Default)]
struct PortalState {
    certificates: HashMap<String, Vec<Certificate>>,
    applications: HashMap<String, Application>,
}

/// Process-local portal used for offline demos and tests. Enforces the
/// same name uniqueness per application and key type as the real portal.
#[derive(Clone, Default)]
pub struct InMemoryPortal {
    state: Arc<Mutex<PortalState>>,
}

impl InMemoryPortal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a certificate as-is, keeping its UUID.
    pub fn insert_certificate(
        &self,
        application_id: &str,
        certificate: Certificate,
    ) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        state
            .certificates
            .entry(application_id.to_string())
            .or_default()
            .push(certificate);
        Ok(())
    }

    pub fn insert_application(&self, application: Application) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        state
            .applications
            .insert(application.application_id.clone(), application);
        Ok(())
    }

    pub fn application(&self, application_id: &str) -> Result<Option<Application>, ApiError> {
        let state = self.lock_state()?;
        Ok(state.applications.get(application_id).cloned())
    }

    /// Seeds one production and one sandbox record if the application has none.
    pub fn seed_demo_certificates(&self, application_id: &str) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        let entry = state
            .certificates
            .entry(application_id.to_string())
            .or_default();
        if !entry.is_empty() {
            return Ok(());
        }
        info!("[portal-memory] seeding demo certificates for {application_id}");
        for (name, key_type) in [
            ("demo-production", KeyType::production()),
            ("demo-sandbox", KeyType::sandbox()),
        ] {
            entry.push(Certificate {
                uuid: Uuid::new_v4().to_string(),
                name: name.to_string(),
                key_type,
                content: None,
            });
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, PortalState>, ApiError> {
        self.state
            .lock()
            .map_err(|err| ApiError::Transport(format!("in-memory portal mutex poisoned: {err}")))
    }
}

fn not_found(uuid: &str) -> ApiError {
    ApiError::api(404, format!("Client certificate {uuid} not found"))
}

fn describe(certificate: &Certificate) -> CertificateDetails {
    let summary = certificate
        .content
        .as_deref()
        .and_then(|content| inspect_certificate(content).ok());
    match summary {
        Some(summary) => CertificateDetails {
            status: if summary.is_expired_at(Utc::now()) {
                STATUS_EXPIRED.to_string()
            } else {
                STATUS_ACTIVE.to_string()
            },
            validity: Some(CertificateValidity {
                from: summary.not_before.to_rfc3339(),
                to: summary.not_after.to_rfc3339(),
            }),
            subject: summary.subject,
            version: Some("3".to_string()),
        },
        None => CertificateDetails {
            status: STATUS_UNKNOWN.to_string(),
            subject: String::new(),
            validity: None,
            version: None,
        },
    }
}

impl DevPortalApi for InMemoryPortal {
    fn list_client_certificates(
        &self,
        application_id: &str,
    ) -> Result<CertificateCollection, ApiError> {
        let state = self.lock_state()?;
        let certificates = state
            .certificates
            .get(application_id)
            .cloned()
            .unwrap_or_default();
        Ok(CertificateCollection {
            count: Some(certificates.len() as u32),
            certificates,
        })
    }

    fn get_client_certificate(
        &self,
        application_id: &str,
        uuid: &str,
    ) -> Result<CertificateDetails, ApiError> {
        let state = self.lock_state()?;
        state
            .certificates
            .get(application_id)
            .and_then(|certs| certs.iter().find(|cert| cert.uuid == uuid))
            .map(describe)
            .ok_or_else(|| not_found(uuid))
    }

    fn add_client_certificate(
        &self,
        application_id: &str,
        content: &str,
        name: &str,
        key_type: &KeyType,
    ) -> Result<Certificate, ApiError> {
        inspect_certificate(content).map_err(|err| ApiError::api(400, err.to_string()))?;

        let mut state = self.lock_state()?;
        let certs = state
            .certificates
            .entry(application_id.to_string())
            .or_default();
        if certs
            .iter()
            .any(|cert| cert.name == name && &cert.key_type == key_type)
        {
            return Err(ApiError::api(
                409,
                format!("Client certificate with name {name} already exists"),
            ));
        }
        let certificate = Certificate {
            uuid: Uuid::new_v4().to_string(),
            name: name.to_string(),
            key_type: key_type.clone(),
            content: Some(content.to_string()),
        };
        debug!(
            "[portal-memory] added {} ({}) to {application_id}",
            certificate.name, certificate.uuid
        );
        certs.push(certificate.clone());
        Ok(certificate)
    }

    fn delete_client_certificate(
        &self,
        application_id: &str,
        uuid: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.lock_state()?;
        let certs = state
            .certificates
            .get_mut(application_id)
            .ok_or_else(|| not_found(uuid))?;
        let before = certs.len();
        certs.retain(|cert| cert.uuid != uuid);
        if certs.len() == before {
            return Err(not_found(uuid));
        }
        Ok(())
    }

    fn update_application(
        &self,
        application: &Application,
        _options: Option<&UpdateOptions>,
    ) -> Result<Application, ApiError> {
        let mut state = self.lock_state()?;
        if !state
            .applications
            .contains_key(&application.application_id)
        {
            return Err(ApiError::api(
                404,
                format!("Application {} not found", application.application_id),
            ));
        }
        state
            .applications
            .insert(application.application_id.clone(), application.clone());
        Ok(application.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificates::upload::tests::sample_pem;

    #[test]
    fn add_then_list_and_describe() {
        let portal = InMemoryPortal::new();
        let created = portal
            .add_client_certificate("app-1", &sample_pem("client-a"), "a", &KeyType::production())
            .unwrap();

        let listed = portal.list_client_certificates("app-1").unwrap();
        assert_eq!(listed.count, Some(1));
        assert_eq!(listed.certificates[0], created);

        let details = portal.get_client_certificate("app-1", &created.uuid).unwrap();
        assert_eq!(details.status, STATUS_ACTIVE);
        assert!(details.subject.contains("CN=client-a"));
        assert!(details.validity.is_some());
    }

    #[test]
    fn names_are_unique_per_key_type() {
        let portal = InMemoryPortal::new();
        let pem = sample_pem("client");
        portal
            .add_client_certificate("app-1", &pem, "shared", &KeyType::production())
            .unwrap();
        portal
            .add_client_certificate("app-1", &pem, "shared", &KeyType::sandbox())
            .unwrap();

        let err = portal
            .add_client_certificate("app-1", &pem, "shared", &KeyType::production())
            .unwrap_err();
        assert_eq!(
            err.description(),
            Some("Client certificate with name shared already exists")
        );
    }

    #[test]
    fn rejects_invalid_payload() {
        let portal = InMemoryPortal::new();
        let err = portal
            .add_client_certificate("app-1", "junk", "bad", &KeyType::production())
            .unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 400, .. }));
    }

    #[test]
    fn delete_unknown_uuid_is_not_found() {
        let portal = InMemoryPortal::new();
        portal.seed_demo_certificates("app-1").unwrap();
        let err = portal.delete_client_certificate("app-1", "missing").unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 404, .. }));
        assert_eq!(portal.list_client_certificates("app-1").unwrap().certificates.len(), 2);
    }

    #[test]
    fn seeding_is_idempotent_and_details_degrade_without_content() {
        let portal = InMemoryPortal::new();
        portal.seed_demo_certificates("app-1").unwrap();
        portal.seed_demo_certificates("app-1").unwrap();
        let listed = portal.list_client_certificates("app-1").unwrap().certificates;
        assert_eq!(listed.len(), 2);

        let details = portal.get_client_certificate("app-1", &listed[0].uuid).unwrap();
        assert_eq!(details.status, STATUS_UNKNOWN);
    }
}

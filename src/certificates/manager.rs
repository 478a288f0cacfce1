//! Certificate management container for one application and key type.

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use super::filter::names_for_type;
use super::list::{ActionOutcome, CertificateList};
use crate::core::error::{FailurePolicy, Operation, report_failure};
use crate::core::messages;
use crate::core::types::{ApplicationSnapshot, Certificate, KeyType, UpdateOptions};
use crate::notify::Notifier;
use crate::portal::DevPortalApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    /// The collection as of the last successful `load`. Later adds and
    /// deletes only change the list view; read `list()` for current data.
    Ready {
        certificates: Vec<Certificate>,
        name_list: Vec<String>,
    },
    Failed {
        message: String,
    },
}

pub enum ManagerView<'a> {
    Loading,
    Failed { message: &'a str },
    Certificates {
        title: &'static str,
        subtitle: &'static str,
        list: &'a CertificateList,
    },
}

pub struct CertificateManager {
    application_id: String,
    key_type: KeyType,
    application: Option<ApplicationSnapshot>,
    api: Arc<dyn DevPortalApi>,
    notifier: Arc<dyn Notifier>,
    policy: FailurePolicy,
    state: LoadState,
    list: Option<CertificateList>,
}

impl CertificateManager {
    pub fn new(
        application_id: impl Into<String>,
        key_type: KeyType,
        api: Arc<dyn DevPortalApi>,
        notifier: Arc<dyn Notifier>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            application_id: application_id.into(),
            key_type,
            application: None,
            api,
            notifier,
            policy,
            state: LoadState::Loading,
            list: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Attaches the application snapshot used by `save_edit`.
    pub fn with_application(mut self, application: ApplicationSnapshot) -> Self {
        self.application = Some(application);
        self
    }

    pub fn application(&self) -> Option<&ApplicationSnapshot> {
        self.application.as_ref()
    }

    /// The list view, available once the collection has loaded.
    pub fn list(&self) -> Option<&CertificateList> {
        self.list.as_ref()
    }

    /// Fetches the full certificate collection. Safe to call again to retry
    /// after a failure; an existing list view is refreshed in place.
    pub fn load(&mut self) -> Result<()> {
        match self.api.list_client_certificates(&self.application_id) {
            Ok(collection) => {
                let certificates = collection.certificates;
                let name_list = names_for_type(&certificates, &self.key_type);
                info!(
                    "[certificates] loaded {} certificate(s) for {} ({} {})",
                    certificates.len(),
                    self.application_id,
                    name_list.len(),
                    self.key_type
                );
                match &self.list {
                    Some(list) => {
                        list.set_certificates(&certificates)?;
                        list.set_name_list(name_list.clone())?;
                    }
                    None => {
                        self.list = Some(CertificateList::new(
                            self.application_id.clone(),
                            self.key_type.clone(),
                            &certificates,
                            name_list.clone(),
                            self.api.clone(),
                            self.notifier.clone(),
                            self.policy,
                        ));
                    }
                }
                self.state = LoadState::Ready {
                    certificates,
                    name_list,
                };
            }
            Err(err) => {
                let message = err
                    .description()
                    .unwrap_or(messages::CERTIFICATES_LOAD_FAILED)
                    .to_string();
                report_failure(
                    self.notifier.as_ref(),
                    Operation::LoadCertificates,
                    &err,
                    self.policy,
                );
                self.state = LoadState::Failed { message };
            }
        }
        Ok(())
    }

    /// Restores the application to the snapshot taken before editing and
    /// persists it.
    pub fn save_edit(&mut self, options: Option<&UpdateOptions>) -> ActionOutcome {
        let Some(snapshot) = self.application.as_mut() else {
            warn!(
                "[certificates] no application attached for {}",
                self.application_id
            );
            self.notifier.error(messages::APPLICATION_NOTHING_TO_RESTORE);
            return ActionOutcome::Ignored;
        };
        let Some(previous) = snapshot.previous.take() else {
            warn!(
                "[certificates] no previous snapshot for application {}",
                self.application_id
            );
            self.notifier.error(messages::APPLICATION_NOTHING_TO_RESTORE);
            return ActionOutcome::Ignored;
        };
        snapshot.current = previous;

        match self.api.update_application(&snapshot.current, options) {
            Ok(updated) => {
                info!(
                    "[certificates] application {} updated",
                    updated.application_id
                );
                snapshot.current = updated;
                self.notifier.info(messages::APPLICATION_UPDATED);
                ActionOutcome::Completed
            }
            Err(err) => {
                report_failure(
                    self.notifier.as_ref(),
                    Operation::UpdateApplication,
                    &err,
                    self.policy,
                );
                ActionOutcome::Failed
            }
        }
    }

    pub fn render(&self) -> ManagerView<'_> {
        match (&self.state, &self.list) {
            (LoadState::Failed { message }, _) => ManagerView::Failed { message },
            (LoadState::Ready { .. }, Some(list)) => ManagerView::Certificates {
                title: messages::CERTIFICATES_TITLE,
                subtitle: messages::CERTIFICATES_SUBTITLE,
                list,
            },
            _ => ManagerView::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ApiError;
    use crate::core::types::Application;
    use crate::notify::{NotificationLevel, NotificationQueue};
    use crate::portal::InMemoryPortal;
    use std::collections::BTreeMap;

    fn application(name: &str) -> Application {
        Application {
            application_id: "app-1".into(),
            name: name.into(),
            throttling_policy: "Unlimited".into(),
            description: None,
            token_type: Some("JWT".into()),
            groups: vec![],
            attributes: BTreeMap::new(),
        }
    }

    fn cert(uuid: &str, name: &str, key_type: &str) -> Certificate {
        Certificate {
            uuid: uuid.into(),
            name: name.into(),
            key_type: KeyType::from(key_type),
            content: None,
        }
    }

    fn manager_with(
        portal: InMemoryPortal,
        snapshot: ApplicationSnapshot,
    ) -> (CertificateManager, NotificationQueue) {
        let queue = NotificationQueue::new();
        let manager = CertificateManager::new(
            "app-1",
            KeyType::from("PROD"),
            Arc::new(portal),
            Arc::new(queue.clone()),
            FailurePolicy::default(),
        )
        .with_application(snapshot);
        (manager, queue)
    }

    /// Portal that rejects every call.
    struct DownPortal;

    impl DevPortalApi for DownPortal {
        fn list_client_certificates(
            &self,
            _: &str,
        ) -> Result<crate::core::types::CertificateCollection, ApiError> {
            Err(ApiError::Transport("connection refused".into()))
        }

        fn get_client_certificate(
            &self,
            _: &str,
            _: &str,
        ) -> Result<crate::core::types::CertificateDetails, ApiError> {
            Err(ApiError::Transport("connection refused".into()))
        }

        fn add_client_certificate(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &KeyType,
        ) -> Result<Certificate, ApiError> {
            Err(ApiError::Transport("connection refused".into()))
        }

        fn delete_client_certificate(&self, _: &str, _: &str) -> Result<(), ApiError> {
            Err(ApiError::Transport("connection refused".into()))
        }

        fn update_application(
            &self,
            _: &Application,
            _: Option<&UpdateOptions>,
        ) -> Result<Application, ApiError> {
            Err(ApiError::Api {
                status: 412,
                body: Some(crate::core::error::ApiErrorBody {
                    code: Some(412),
                    message: Some("Precondition Failed".into()),
                    description: None,
                }),
            })
        }
    }

    #[test]
    fn starts_loading_then_exposes_filtered_list() {
        let portal = InMemoryPortal::new();
        portal.insert_certificate("app-1", cert("a", "cert1", "PROD")).unwrap();
        portal.insert_certificate("app-1", cert("b", "cert2", "SANDBOX")).unwrap();
        let (mut manager, queue) =
            manager_with(portal, ApplicationSnapshot::new(application("Mobile")));

        assert!(matches!(manager.render(), ManagerView::Loading));
        manager.load().unwrap();

        match manager.state() {
            LoadState::Ready {
                certificates,
                name_list,
            } => {
                assert_eq!(certificates.len(), 2);
                assert_eq!(name_list, &vec!["cert1".to_string()]);
            }
            other => panic!("unexpected state: {other:?}"),
        }
        match manager.render() {
            ManagerView::Certificates { list, title, .. } => {
                assert_eq!(title, messages::CERTIFICATES_TITLE);
                assert_eq!(list.certificates().unwrap(), vec![cert("a", "cert1", "PROD")]);
                assert_eq!(list.name_list().unwrap(), vec!["cert1".to_string()]);
            }
            _ => panic!("expected certificate view"),
        }
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn reload_refreshes_existing_list() {
        let portal = InMemoryPortal::new();
        portal.insert_certificate("app-1", cert("a", "cert1", "PROD")).unwrap();
        let (mut manager, _) =
            manager_with(portal.clone(), ApplicationSnapshot::new(application("Mobile")));
        manager.load().unwrap();
        let handle = manager.list().unwrap().clone();

        portal.insert_certificate("app-1", cert("c", "cert3", "PROD")).unwrap();
        manager.load().unwrap();
        assert_eq!(handle.certificates().unwrap().len(), 2);
    }

    #[test]
    fn ready_state_keeps_load_time_collection() {
        let portal = InMemoryPortal::new();
        portal.insert_certificate("app-1", cert("a", "cert1", "PROD")).unwrap();
        let (mut manager, _) =
            manager_with(portal, ApplicationSnapshot::new(application("Mobile")));
        manager.load().unwrap();

        let list = manager.list().unwrap().clone();
        list.request_delete("a", "cert1").unwrap();
        assert_eq!(list.confirm_delete().unwrap(), ActionOutcome::Completed);

        assert!(list.name_list().unwrap().is_empty());
        match manager.state() {
            LoadState::Ready { name_list, .. } => {
                assert_eq!(name_list, &vec!["cert1".to_string()]);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn load_failure_is_explicit_and_notified() {
        let queue = NotificationQueue::new();
        let mut manager = CertificateManager::new(
            "app-1",
            KeyType::production(),
            Arc::new(DownPortal),
            Arc::new(queue.clone()),
            FailurePolicy::default(),
        );
        manager.load().unwrap();

        assert_eq!(
            manager.state(),
            &LoadState::Failed {
                message: messages::CERTIFICATES_LOAD_FAILED.to_string()
            }
        );
        assert!(matches!(manager.render(), ManagerView::Failed { .. }));
        assert!(manager.list().is_none());
        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].level, NotificationLevel::Error);
    }

    #[test]
    fn save_edit_restores_previous_snapshot() {
        let portal = InMemoryPortal::new();
        portal.insert_application(application("Edited")).unwrap();
        let (mut manager, queue) = manager_with(
            portal.clone(),
            ApplicationSnapshot::with_previous(application("Edited"), application("Original")),
        );

        assert_eq!(manager.save_edit(None), ActionOutcome::Completed);
        let snapshot = manager.application().unwrap();
        assert_eq!(snapshot.current.name, "Original");
        assert!(snapshot.previous.is_none());
        assert_eq!(
            portal.application("app-1").unwrap().map(|app| app.name),
            Some("Original".to_string())
        );
        let drained = queue.drain();
        assert_eq!(drained[0].message, messages::APPLICATION_UPDATED);
    }

    #[test]
    fn save_edit_reports_update_failures() {
        let queue = NotificationQueue::new();
        let mut manager = CertificateManager::new(
            "app-1",
            KeyType::production(),
            Arc::new(DownPortal),
            Arc::new(queue.clone()),
            FailurePolicy::default(),
        )
        .with_application(ApplicationSnapshot::with_previous(
            application("Edited"),
            application("Original"),
        ));
        assert_eq!(manager.save_edit(None), ActionOutcome::Failed);
        let drained = queue.drain();
        assert_eq!(drained[0].level, NotificationLevel::Error);
        assert_eq!(drained[0].message, messages::APPLICATION_UPDATE_FAILED);
    }

    #[test]
    fn save_edit_without_application_is_ignored() {
        let queue = NotificationQueue::new();
        let mut manager = CertificateManager::new(
            "app-1",
            KeyType::production(),
            Arc::new(DownPortal),
            Arc::new(queue.clone()),
            FailurePolicy::default(),
        );
        assert!(manager.application().is_none());
        assert_eq!(manager.save_edit(None), ActionOutcome::Ignored);
        assert_eq!(
            queue.drain()[0].message,
            messages::APPLICATION_NOTHING_TO_RESTORE
        );
    }

    #[test]
    fn save_edit_without_previous_snapshot_is_ignored() {
        let (mut manager, queue) = manager_with(
            InMemoryPortal::new(),
            ApplicationSnapshot::new(application("Mobile")),
        );
        assert_eq!(manager.save_edit(None), ActionOutcome::Ignored);
        assert_eq!(
            queue.drain()[0].message,
            messages::APPLICATION_NOTHING_TO_RESTORE
        );
    }
}

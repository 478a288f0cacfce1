//! Certificate list view-model: the displayed subset for one key type plus
//! the upload, delete-confirmation and details dialogs.
//!
//! State lives behind a mutex that is only held while reading or applying a
//! change, never across a portal call. Independent operations started from
//! different threads therefore run concurrently and apply their results in
//! completion order.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use log::{debug, info, warn};

use super::filter::filter_by_type;
use super::upload::{UploadForm, validate_upload};
use crate::core::error::{FailurePolicy, Operation, report_failure};
use crate::core::messages;
use crate::core::types::{Certificate, CertificateDetails, KeyType};
use crate::notify::Notifier;
use crate::portal::DevPortalApi;

/// At most one dialog is open at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Uploading,
    ConfirmingDelete {
        uuid: String,
        name: String,
        /// Set while the delete request is outstanding; disables confirm.
        in_flight: bool,
    },
    ShowingDetails {
        name: String,
        details: CertificateDetails,
    },
}

/// Result of a user action after any failure has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Failed,
    /// The action did not apply to the current state (e.g. a second confirm).
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRow {
    pub uuid: String,
    pub name: String,
    pub divider_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Empty { placeholder: &'static str },
    Rows(Vec<CertificateRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogView {
    None,
    Upload,
    ConfirmDelete {
        title: &'static str,
        prompt: String,
        confirm_enabled: bool,
    },
    Details {
        title: String,
        lines: Vec<String>,
    },
}

struct ListState {
    displayed: Vec<Certificate>,
    name_list: Vec<String>,
    dialog: DialogState,
}

impl ListState {
    fn delete_in_flight(&self) -> bool {
        matches!(
            self.dialog,
            DialogState::ConfirmingDelete {
                in_flight: true,
                ..
            }
        )
    }
}

#[derive(Clone)]
pub struct CertificateList {
    application_id: String,
    key_type: KeyType,
    api: Arc<dyn DevPortalApi>,
    notifier: Arc<dyn Notifier>,
    policy: FailurePolicy,
    state: Arc<Mutex<ListState>>,
}

impl CertificateList {
    pub fn new(
        application_id: impl Into<String>,
        key_type: KeyType,
        certificates: &[Certificate],
        name_list: Vec<String>,
        api: Arc<dyn DevPortalApi>,
        notifier: Arc<dyn Notifier>,
        policy: FailurePolicy,
    ) -> Self {
        let displayed = filter_by_type(certificates, &key_type);
        Self {
            application_id: application_id.into(),
            key_type,
            api,
            notifier,
            policy,
            state: Arc::new(Mutex::new(ListState {
                displayed,
                name_list,
                dialog: DialogState::Closed,
            })),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn key_type(&self) -> &KeyType {
        &self.key_type
    }

    /// Replaces the displayed subset from a new full collection.
    pub fn set_certificates(&self, collection: &[Certificate]) -> Result<()> {
        let displayed = filter_by_type(collection, &self.key_type);
        let mut state = self.lock_state()?;
        state.displayed = displayed;
        Ok(())
    }

    pub fn set_name_list(&self, names: Vec<String>) -> Result<()> {
        self.lock_state()?.name_list = names;
        Ok(())
    }

    pub fn certificates(&self) -> Result<Vec<Certificate>> {
        Ok(self.lock_state()?.displayed.clone())
    }

    pub fn name_list(&self) -> Result<Vec<String>> {
        Ok(self.lock_state()?.name_list.clone())
    }

    pub fn dialog(&self) -> Result<DialogState> {
        Ok(self.lock_state()?.dialog.clone())
    }

    pub fn is_deleting(&self) -> Result<bool> {
        Ok(self.lock_state()?.delete_in_flight())
    }

    pub fn open_upload(&self) -> Result<ActionOutcome> {
        let mut state = self.lock_state()?;
        if state.dialog != DialogState::Closed {
            return Ok(ActionOutcome::Ignored);
        }
        state.dialog = DialogState::Uploading;
        Ok(ActionOutcome::Completed)
    }

    pub fn close_upload(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.dialog == DialogState::Uploading {
            state.dialog = DialogState::Closed;
        }
        Ok(())
    }

    /// Validates the form locally, then uploads it.
    pub fn upload(&self, form: &UploadForm) -> Result<ActionOutcome> {
        let names = self.name_list()?;
        match validate_upload(form, &names) {
            Ok(upload) => {
                debug!(
                    "[certificates] uploading {} (subject {}, sha256 {})",
                    upload.name, upload.summary.subject, upload.summary.fingerprint
                );
                self.save_certificate(&upload.content, &upload.name)
            }
            Err(err) => {
                warn!("[certificates] upload rejected: {err}");
                self.notifier.error(&err.to_string());
                Ok(ActionOutcome::Failed)
            }
        }
    }

    /// Sends a certificate to the portal and appends the stored record.
    /// Ignored while a delete is outstanding.
    pub fn save_certificate(&self, content: &str, name: &str) -> Result<ActionOutcome> {
        if self.lock_state()?.delete_in_flight() {
            debug!("[certificates] add of {name} ignored, delete in flight");
            return Ok(ActionOutcome::Ignored);
        }
        let result =
            self.api
                .add_client_certificate(&self.application_id, content, name, &self.key_type);
        match result {
            Ok(created) => {
                info!(
                    "[certificates] added {} ({}) to {}",
                    created.name, created.uuid, self.application_id
                );
                {
                    let mut state = self.lock_state()?;
                    state.displayed.retain(|cert| cert.uuid != created.uuid);
                    if !state.name_list.contains(&created.name) {
                        state.name_list.push(created.name.clone());
                    }
                    state.displayed.push(created);
                    if state.dialog == DialogState::Uploading {
                        state.dialog = DialogState::Closed;
                    }
                }
                self.notifier.info(messages::CERTIFICATE_ADDED);
                Ok(ActionOutcome::Completed)
            }
            Err(err) => {
                report_failure(
                    self.notifier.as_ref(),
                    Operation::AddCertificate,
                    &err,
                    self.policy,
                );
                Ok(ActionOutcome::Failed)
            }
        }
    }

    /// Fetches details for one certificate and opens the details dialog.
    /// Ignored while a delete is outstanding, including one that started
    /// during the fetch.
    pub fn show_details(&self, name: &str, uuid: &str) -> Result<ActionOutcome> {
        if self.lock_state()?.delete_in_flight() {
            debug!("[certificates] details of {name} ignored, delete in flight");
            return Ok(ActionOutcome::Ignored);
        }
        match self.api.get_client_certificate(&self.application_id, uuid) {
            Ok(details) => {
                let mut state = self.lock_state()?;
                if state.delete_in_flight() {
                    debug!("[certificates] details of {name} dropped, delete in flight");
                    return Ok(ActionOutcome::Ignored);
                }
                state.dialog = DialogState::ShowingDetails {
                    name: name.to_string(),
                    details,
                };
                Ok(ActionOutcome::Completed)
            }
            Err(err) => {
                report_failure(
                    self.notifier.as_ref(),
                    Operation::FetchDetails,
                    &err,
                    self.policy,
                );
                Ok(ActionOutcome::Failed)
            }
        }
    }

    pub fn close_details(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if matches!(state.dialog, DialogState::ShowingDetails { .. }) {
            state.dialog = DialogState::Closed;
        }
        Ok(())
    }

    /// Opens the confirmation dialog for a certificate.
    pub fn request_delete(&self, uuid: &str, name: &str) -> Result<ActionOutcome> {
        let mut state = self.lock_state()?;
        if state.delete_in_flight() {
            return Ok(ActionOutcome::Ignored);
        }
        state.dialog = DialogState::ConfirmingDelete {
            uuid: uuid.to_string(),
            name: name.to_string(),
            in_flight: false,
        };
        Ok(ActionOutcome::Completed)
    }

    pub fn cancel_delete(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if matches!(state.dialog, DialogState::ConfirmingDelete { .. }) {
            state.dialog = DialogState::Closed;
        }
        Ok(())
    }

    /// Deletes the certificate held by the confirmation dialog.
    pub fn confirm_delete(&self) -> Result<ActionOutcome> {
        let uuid = {
            let mut state = self.lock_state()?;
            match &mut state.dialog {
                DialogState::ConfirmingDelete {
                    uuid, in_flight, ..
                } if !*in_flight => {
                    *in_flight = true;
                    uuid.clone()
                }
                _ => return Ok(ActionOutcome::Ignored),
            }
        };

        let result = self
            .api
            .delete_client_certificate(&self.application_id, &uuid);

        let outcome = {
            let mut state = self.lock_state()?;
            let dialog_targets_uuid = matches!(
                &state.dialog,
                DialogState::ConfirmingDelete { uuid: target, .. } if *target == uuid
            );
            if let DialogState::ConfirmingDelete { in_flight, .. } = &mut state.dialog {
                if dialog_targets_uuid {
                    *in_flight = false;
                }
            }
            match &result {
                Ok(()) => {
                    let removed: Vec<String> = state
                        .displayed
                        .iter()
                        .filter(|cert| cert.uuid == uuid)
                        .map(|cert| cert.name.clone())
                        .collect();
                    state.displayed.retain(|cert| cert.uuid != uuid);
                    state.name_list.retain(|name| !removed.contains(name));
                    if dialog_targets_uuid {
                        state.dialog = DialogState::Closed;
                    }
                    ActionOutcome::Completed
                }
                Err(_) => ActionOutcome::Failed,
            }
        };

        match result {
            Ok(()) => {
                info!(
                    "[certificates] deleted {uuid} from {}",
                    self.application_id
                );
                self.notifier.info(messages::CERTIFICATE_DELETED);
            }
            Err(err) => {
                report_failure(
                    self.notifier.as_ref(),
                    Operation::DeleteCertificate,
                    &err,
                    self.policy,
                );
            }
        }
        Ok(outcome)
    }

    pub fn render(&self) -> Result<ListView> {
        let state = self.lock_state()?;
        if state.displayed.is_empty() {
            return Ok(ListView::Empty {
                placeholder: messages::NO_CERTIFICATES,
            });
        }
        let last = state.displayed.len() - 1;
        Ok(ListView::Rows(
            state
                .displayed
                .iter()
                .enumerate()
                .map(|(index, cert)| CertificateRow {
                    uuid: cert.uuid.clone(),
                    name: cert.name.clone(),
                    divider_after: index < last,
                })
                .collect(),
        ))
    }

    pub fn render_dialog(&self) -> Result<DialogView> {
        let state = self.lock_state()?;
        Ok(match &state.dialog {
            DialogState::Closed => DialogView::None,
            DialogState::Uploading => DialogView::Upload,
            DialogState::ConfirmingDelete {
                name, in_flight, ..
            } => DialogView::ConfirmDelete {
                title: "Delete Certificate",
                prompt: format!("Do you want to delete {name}?"),
                confirm_enabled: !*in_flight,
            },
            DialogState::ShowingDetails { name, details } => DialogView::Details {
                title: format!("Details of {name}"),
                lines: vec![
                    format!("Status : {}", details.status),
                    format!("Subject : {}", details.subject),
                ],
            },
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ListState>> {
        self.state
            .lock()
            .map_err(|err| anyhow!("certificate list mutex poisoned: {err}"))
    }
}

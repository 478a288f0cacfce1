use log::error;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::messages;
use crate::notify::Notifier;

/// Structured error body returned by the portal on application-level failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Errors produced by a portal API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, timeout, TLS).
    #[error("portal request failed: {0}")]
    Transport(String),
    /// The portal answered with a non-success status.
    #[error("portal API error ({status}){}", describe_body(.body))]
    Api {
        status: u16,
        body: Option<ApiErrorBody>,
    },
    /// The response arrived but could not be decoded.
    #[error("failed to decode portal response: {0}")]
    Decode(String),
}

fn describe_body(body: &Option<ApiErrorBody>) -> String {
    match body {
        Some(ApiErrorBody {
            description: Some(description),
            ..
        }) => format!(": {description}"),
        Some(ApiErrorBody {
            message: Some(message),
            ..
        }) => format!(": {message}"),
        _ => String::new(),
    }
}

impl ApiError {
    pub fn api(status: u16, description: impl Into<String>) -> Self {
        ApiError::Api {
            status,
            body: Some(ApiErrorBody {
                code: Some(i64::from(status)),
                message: None,
                description: Some(description.into()),
            }),
        }
    }

    /// Whether the failure came with a structured response body.
    pub fn has_body(&self) -> bool {
        matches!(self, ApiError::Api { body: Some(_), .. })
    }

    /// Server-provided human readable description, when present.
    pub fn description(&self) -> Option<&str> {
        match self {
            ApiError::Api {
                body: Some(body), ..
            } => body
                .description
                .as_deref()
                .filter(|description| !description.trim().is_empty()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ApiError::Decode(value.to_string())
        } else {
            ApiError::Transport(value.to_string())
        }
    }
}

/// Portal calls whose failures are reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    LoadCertificates,
    FetchDetails,
    AddCertificate,
    DeleteCertificate,
    UpdateApplication,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Operation::LoadCertificates => "load certificates",
            Operation::FetchDetails => "fetch certificate details",
            Operation::AddCertificate => "add certificate",
            Operation::DeleteCertificate => "delete certificate",
            Operation::UpdateApplication => "update application",
        }
    }
}

/// What happens to a failure after it has been logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Notify(String),
    LogOnly,
}

/// Knobs for how failures surface.
#[derive(Debug, Clone, Copy)]
pub struct FailurePolicy {
    /// When false, detail fetch failures are only logged.
    pub surface_detail_errors: bool,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            surface_detail_errors: true,
        }
    }
}

/// Maps an operation failure to its user-visible outcome.
pub fn failure_disposition(
    operation: Operation,
    err: &ApiError,
    policy: FailurePolicy,
) -> Disposition {
    let described = |fallback: &str| {
        Disposition::Notify(
            err.description()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        )
    };

    match operation {
        Operation::LoadCertificates => described(messages::CERTIFICATES_LOAD_FAILED),
        Operation::FetchDetails if !policy.surface_detail_errors => Disposition::LogOnly,
        Operation::FetchDetails => described(messages::CERTIFICATE_DETAILS_FAILED),
        Operation::AddCertificate => described(messages::CERTIFICATE_ADD_FAILED),
        Operation::DeleteCertificate => described(messages::CERTIFICATE_DELETE_FAILED),
        Operation::UpdateApplication if err.has_body() => {
            described(messages::APPLICATION_UPDATE_FAILED)
        }
        Operation::UpdateApplication => Disposition::Notify(err.to_string()),
    }
}

/// Logs a failure and forwards it to the notifier per its disposition.
pub fn report_failure(
    notifier: &dyn Notifier,
    operation: Operation,
    err: &ApiError,
    policy: FailurePolicy,
) -> Disposition {
    error!("[certificates] {} failed: {err}", operation.label());
    let disposition = failure_disposition(operation, err, policy);
    if let Disposition::Notify(message) = &disposition {
        notifier.error(message);
    }
    disposition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodyless(status: u16) -> ApiError {
        ApiError::Api { status, body: None }
    }

    #[test]
    fn description_is_preferred_when_present() {
        let err = ApiError::api(409, "Certificate with name cert1 already exists");
        assert_eq!(
            failure_disposition(Operation::AddCertificate, &err, FailurePolicy::default()),
            Disposition::Notify("Certificate with name cert1 already exists".into())
        );
    }

    #[test]
    fn transport_failures_fall_back_to_generic_message() {
        let err = ApiError::Transport("connection refused".into());
        assert_eq!(
            failure_disposition(Operation::AddCertificate, &err, FailurePolicy::default()),
            Disposition::Notify(messages::CERTIFICATE_ADD_FAILED.into())
        );
        assert_eq!(
            failure_disposition(Operation::DeleteCertificate, &err, FailurePolicy::default()),
            Disposition::Notify(messages::CERTIFICATE_DELETE_FAILED.into())
        );
    }

    #[test]
    fn blank_description_counts_as_missing() {
        let err = ApiError::api(500, "   ");
        assert!(err.description().is_none());
        assert_eq!(
            failure_disposition(Operation::LoadCertificates, &err, FailurePolicy::default()),
            Disposition::Notify(messages::CERTIFICATES_LOAD_FAILED.into())
        );
    }

    #[test]
    fn detail_failures_can_be_kept_quiet() {
        let err = ApiError::Transport("timeout".into());
        let quiet = FailurePolicy {
            surface_detail_errors: false,
        };
        assert_eq!(
            failure_disposition(Operation::FetchDetails, &err, quiet),
            Disposition::LogOnly
        );
        assert_eq!(
            failure_disposition(Operation::FetchDetails, &err, FailurePolicy::default()),
            Disposition::Notify(messages::CERTIFICATE_DETAILS_FAILED.into())
        );
    }

    #[test]
    fn update_failures_follow_body_then_message() {
        let policy = FailurePolicy::default();
        let described = ApiError::api(400, "Application name is too long");
        assert_eq!(
            failure_disposition(Operation::UpdateApplication, &described, policy),
            Disposition::Notify("Application name is too long".into())
        );

        let body_without_description = ApiError::Api {
            status: 400,
            body: Some(ApiErrorBody::default()),
        };
        assert_eq!(
            failure_disposition(Operation::UpdateApplication, &body_without_description, policy),
            Disposition::Notify(messages::APPLICATION_UPDATE_FAILED.into())
        );

        let transport = ApiError::Transport("connection reset".into());
        assert_eq!(
            failure_disposition(Operation::UpdateApplication, &transport, policy),
            Disposition::Notify("portal request failed: connection reset".into())
        );

        assert_eq!(
            failure_disposition(Operation::UpdateApplication, &bodyless(502), policy),
            Disposition::Notify("portal API error (502)".into())
        );
    }
}

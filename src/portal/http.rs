use std::time::Duration;

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::core::error::{ApiError, ApiErrorBody};

pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|err| {
            warn!("[portal-http] failed to build client: {err}");
            Client::new()
        })
}

/// Converts a non-success response into an `ApiError`, keeping the
/// structured body when the portal sent one.
pub fn status_error(status: StatusCode, body: Option<String>) -> ApiError {
    let parsed = body
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| serde_json::from_str::<ApiErrorBody>(raw).ok());
    if parsed.is_none() {
        if let Some(raw) = body.as_deref().filter(|raw| !raw.trim().is_empty()) {
            debug!("[portal-http] unstructured error body ({status}): {raw}");
        }
    }
    ApiError::Api {
        status: status.as_u16(),
        body: parsed,
    }
}

pub fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().ok();
    Err(status_error(status, body))
}

pub fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response)?;
    let text = response.text()?;
    serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::status_error;
    use crate::core::error::ApiError;
    use reqwest::StatusCode;

    #[test]
    fn status_error_keeps_structured_body() {
        let err = status_error(
            StatusCode::CONFLICT,
            Some(r#"{"code":409,"message":"Conflict","description":"Duplicate name"}"#.into()),
        );
        assert!(err.has_body());
        assert_eq!(err.description(), Some("Duplicate name"));
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn status_error_drops_unstructured_body() {
        let err = status_error(StatusCode::BAD_GATEWAY, Some("<html>bad gateway</html>".into()));
        assert!(matches!(err, ApiError::Api { status: 502, body: None }));
        assert!(err.description().is_none());
    }

    #[test]
    fn status_error_without_body() {
        let err = status_error(StatusCode::UNAUTHORIZED, None);
        assert!(!err.has_body());
        assert_eq!(err.to_string(), "portal API error (401)");
    }
}

use std::time::Duration;

use log::warn;

use crate::core::error::FailurePolicy;

pub const BASE_URL_ENV: &str = "DEVPORTAL_BASE_URL";
pub const ACCESS_TOKEN_ENV: &str = "DEVPORTAL_ACCESS_TOKEN";
pub const TIMEOUT_ENV: &str = "DEVPORTAL_HTTP_TIMEOUT_SECS";
pub const SURFACE_DETAIL_ERRORS_ENV: &str = "DEVPORTAL_SURFACE_DETAIL_ERRORS";

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for the developer portal, read from the environment.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// REST API root, e.g. `https://portal.example.com/api/am/devportal/v3`.
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl PortalConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: non_empty_var(BASE_URL_ENV),
            access_token: non_empty_var(ACCESS_TOKEN_ENV),
            timeout: resolve_timeout(),
            failure_policy: FailurePolicy {
                surface_detail_errors: resolve_flag(SURFACE_DETAIL_ERRORS_ENV, true),
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_timeout() -> Duration {
    let timeout = std::env::var(TIMEOUT_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout == 0 {
        warn!("[config] invalid timeout value; using default");
        return Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    }
    Duration::from_secs(timeout)
}

fn resolve_flag(key: &str, default: bool) -> bool {
    match non_empty_var(key).map(|raw| raw.to_ascii_lowercase()).as_deref() {
        None => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            warn!("[config] unrecognised value for {key}: {other}; using {default}");
            default
        }
    }
}

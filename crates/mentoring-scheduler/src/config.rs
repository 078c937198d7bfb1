//! Scheduler client configuration.
//!
//! Resolved once at startup and handed to [`SchedulerClient::new`](crate::SchedulerClient::new).
//! The client itself never reads the environment.

use std::fmt;
use std::time::Duration;

use reqwest::header::HeaderMap;
use thiserror::Error;

use crate::{CallbackTarget, Endpoint, INTERNAL_ACCESS_TOKEN_HEADER};

/// Route on this service that the scheduler calls when a job fires.
pub const CALLBACK_PATH: &str = "/mentoring/v1/notifications/emailCronJob";

const DEFAULT_CALLBACK_HOST: &str = "localhost";

/// Scheduler service host, e.g. `http://scheduler:4000`.
pub const SERVICE_HOST_VAR: &str = "SCHEDULER_SERVICE_HOST";
/// Base path appended to the host. Optional, empty when unset.
pub const SERVICE_BASE_URL_VAR: &str = "SCHEDULER_SERVICE_BASE_URL";
pub const ERROR_REPORTING_EMAIL_VAR: &str = "SCHEDULER_SERVICE_ERROR_REPORTING_EMAIL_ID";
pub const INTERNAL_ACCESS_TOKEN_VAR: &str = "INTERNAL_ACCESS_TOKEN";
pub const APPLICATION_PORT_VAR: &str = "APPLICATION_PORT";
/// Optional, defaults to `localhost`.
pub const CALLBACK_HOST_VAR: &str = "SCHEDULER_CALLBACK_HOST";
/// Optional, in milliseconds.
pub const REQUEST_TIMEOUT_MS_VAR: &str = "SCHEDULER_REQUEST_TIMEOUT_MS";

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {var} ({value:?}): {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the client needs to reach the scheduler and configure callbacks.
#[derive(Clone)]
pub struct SchedulerConfig {
    /// Scheduler host and base path, e.g. `http://scheduler:4000/scheduler/jobs`.
    pub service_url: String,
    /// Recipient of scheduler-side failure reports for every created job.
    pub error_reporting_email: String,
    /// Shared secret the scheduler presents when it calls back.
    pub internal_access_token: String,
    /// Port this service listens on; used for the callback URL.
    pub application_port: u16,
    /// Host of this service as seen from the scheduler.
    pub callback_host: String,
    /// Per-request timeout. `None` leaves the HTTP client's default in place.
    pub request_timeout: Option<Duration>,
}

impl SchedulerConfig {
    /// Create a configuration with the default callback host and no timeout.
    pub fn new(
        service_url: impl Into<String>,
        error_reporting_email: impl Into<String>,
        internal_access_token: impl Into<String>,
        application_port: u16,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            error_reporting_email: error_reporting_email.into(),
            internal_access_token: internal_access_token.into(),
            application_port,
            callback_host: DEFAULT_CALLBACK_HOST.to_string(),
            request_timeout: None,
        }
    }

    /// Override the host used in the callback URL.
    pub fn with_callback_host(mut self, host: impl Into<String>) -> Self {
        self.callback_host = host.into();
        self
    }

    /// Bound every request to `timeout` instead of the HTTP client default.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Required: `SCHEDULER_SERVICE_HOST`,
    /// `SCHEDULER_SERVICE_ERROR_REPORTING_EMAIL_ID`, `INTERNAL_ACCESS_TOKEN`,
    /// `APPLICATION_PORT`. Optional: `SCHEDULER_SERVICE_BASE_URL`,
    /// `SCHEDULER_CALLBACK_HOST`, `SCHEDULER_REQUEST_TIMEOUT_MS`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let host = required(SERVICE_HOST_VAR)?;
        let base_url = lookup(SERVICE_BASE_URL_VAR).unwrap_or_default();
        let email = required(ERROR_REPORTING_EMAIL_VAR)?;
        let token = required(INTERNAL_ACCESS_TOKEN_VAR)?;

        let port_raw = required(APPLICATION_PORT_VAR)?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                var: APPLICATION_PORT_VAR,
                value: port_raw.clone(),
                reason: e.to_string(),
            })?;

        let mut config = Self::new(format!("{}{}", host, base_url), email, token, port);

        if let Some(host) = lookup(CALLBACK_HOST_VAR).filter(|v| !v.is_empty()) {
            config = config.with_callback_host(host);
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_MS_VAR).filter(|v| !v.is_empty()) {
            let millis = raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: REQUEST_TIMEOUT_MS_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            config = config.with_request_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }

    /// Full URL of a scheduler endpoint.
    pub fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/{}",
            self.service_url.trim_end_matches('/'),
            endpoint.path()
        )
    }

    /// URL the scheduler calls back when a job fires.
    pub fn callback_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.callback_host, self.application_port, CALLBACK_PATH
        )
    }

    /// Callback the scheduler makes when a job fires, authenticated with the
    /// internal access token.
    pub fn callback_target(&self) -> CallbackTarget {
        CallbackTarget::post(self.callback_url(), self.internal_access_token.clone())
    }

    /// Check the [`INTERNAL_ACCESS_TOKEN_HEADER`] of an inbound callback request.
    pub fn authorizes_callback_headers(&self, headers: &HeaderMap) -> bool {
        self.authorizes_callback(
            headers
                .get(INTERNAL_ACCESS_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok()),
        )
    }

    /// Check a presented callback token against the configured secret.
    pub fn authorizes_callback(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        let expected = self.internal_access_token.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        // Compare every byte so timing does not leak the matching prefix.
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for SchedulerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerConfig")
            .field("service_url", &self.service_url)
            .field("error_reporting_email", &self.error_reporting_email)
            .field("internal_access_token", &"[redacted]")
            .field("application_port", &self.application_port)
            .field("callback_host", &self.callback_host)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

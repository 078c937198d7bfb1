//! Wire types for the scheduler service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header the scheduler sends back when a job fires.
pub const INTERNAL_ACCESS_TOKEN_HEADER: &str = "internal_access_token";

/// Scheduler endpoints, relative to the configured service URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CreateSchedulerJob,
    UpdateDelay,
    RemoveScheduledJob,
}

impl Endpoint {
    /// Path segment appended to the service URL.
    pub fn path(self) -> &'static str {
        match self {
            Self::CreateSchedulerJob => "CREATE_SCHEDULER_JOB",
            Self::UpdateDelay => "UPDATE_DELAY",
            Self::RemoveScheduledJob => "REMOVE_SCHEDULED_JOB",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Returned when a job ID is empty or only whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("job id must not be empty")]
pub struct EmptyJobId;

/// Caller-chosen identifier of a scheduled job.
///
/// Uniqueness is the caller's responsibility. What the scheduler does when an
/// ID is reused on create is up to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Wrap a job ID, rejecting empty or whitespace-only input.
    pub fn new(id: impl Into<String>) -> Result<Self, EmptyJobId> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EmptyJobId);
        }
        Ok(Self(id))
    }

    /// The ID as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobId {
    type Error = EmptyJobId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for JobId {
    type Err = EmptyJobId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `CREATE_SCHEDULER_JOB`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    /// Job classification, e.g. `session-reminder`.
    pub job_name: String,
    /// Recipients of scheduler-side failure reports.
    pub email: Vec<String>,
    /// Call the scheduler makes when the job fires.
    pub request: CallbackTarget,
    pub job_options: JobOptions,
}

/// HTTP call the scheduler makes when the job fires.
#[derive(Clone, Serialize)]
pub struct CallbackTarget {
    pub url: String,
    pub method: &'static str,
    pub header: CallbackHeader,
}

impl CallbackTarget {
    /// A POST callback authenticated with the shared internal token.
    pub fn post(url: impl Into<String>, internal_access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "post",
            header: CallbackHeader {
                internal_access_token: internal_access_token.into(),
            },
        }
    }
}

impl fmt::Debug for CallbackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTarget")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("header", &"[redacted]")
            .finish()
    }
}

/// Headers attached to the callback.
///
/// The field name is the header name, [`INTERNAL_ACCESS_TOKEN_HEADER`].
#[derive(Clone, Serialize)]
pub struct CallbackHeader {
    pub internal_access_token: String,
}

/// Execution policy and identity of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOptions {
    pub job_id: JobId,
    /// Milliseconds until the job fires.
    pub delay: u64,
    /// Template handed to the notification renderer, passed through opaquely.
    pub email_template: String,
    pub remove_on_complete: bool,
    pub remove_on_fail: bool,
    pub attempts: u32,
}

impl JobOptions {
    /// One delivery attempt; completed jobs are purged, failed ones kept for inspection.
    pub fn single_attempt(job_id: JobId, delay: u64, email_template: impl Into<String>) -> Self {
        Self {
            job_id,
            delay,
            email_template: email_template.into(),
            remove_on_complete: true,
            remove_on_fail: false,
            attempts: 1,
        }
    }
}

/// Typed body for `UPDATE_DELAY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayUpdate {
    pub job_id: JobId,
    pub delay: u64,
}

/// Typed body for `REMOVE_SCHEDULED_JOB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRemoval {
    pub job_id: JobId,
}

/// A reply from the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerResponse {
    /// `success: true`; carries `message` (null if absent).
    Accepted { message: serde_json::Value },
    /// `success: false`; carries the whole body untouched.
    Rejected { body: serde_json::Value },
}

impl SchedulerResponse {
    /// Interpret a decoded body. Returns `None` unless `success` is a boolean.
    pub fn interpret(mut body: serde_json::Value) -> Option<Self> {
        match body.get("success")?.as_bool()? {
            true => {
                let message = body
                    .get_mut("message")
                    .map(serde_json::Value::take)
                    .unwrap_or(serde_json::Value::Null);
                Some(Self::Accepted { message })
            }
            false => Some(Self::Rejected { body }),
        }
    }
}

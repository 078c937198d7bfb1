//! HTTP client for the remote notification job scheduler.
//!
//! This crate lets a service hand delayed notification jobs to an external
//! scheduler and manage them afterwards:
//! - Create a job with a caller-chosen ID, delay and email template
//! - Change the delay of a pending job
//! - Remove a job before it fires
//!
//! The client keeps no job state. The scheduler is the only source of truth,
//! and every call is a single independent HTTP request.

mod client;
mod config;
mod error;
mod types;

pub use client::{JobScheduler, SchedulerClient};
pub use config::{
    APPLICATION_PORT_VAR, CALLBACK_HOST_VAR, CALLBACK_PATH, ConfigError, ERROR_REPORTING_EMAIL_VAR,
    INTERNAL_ACCESS_TOKEN_VAR, REQUEST_TIMEOUT_MS_VAR, SERVICE_BASE_URL_VAR, SERVICE_HOST_VAR,
    SchedulerConfig,
};
pub use error::{SchedulerError, TransportError};
pub use types::{
    CallbackHeader, CallbackTarget, CreateJobRequest, DelayUpdate, EmptyJobId, Endpoint,
    INTERNAL_ACCESS_TOKEN_HEADER, JobId, JobOptions, JobRemoval, SchedulerResponse,
};

//! Scheduler service client.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    CreateJobRequest, Endpoint, JobId, JobOptions, SchedulerConfig, SchedulerError,
    SchedulerResponse, TransportError,
};

/// Lifecycle operations on remote notification jobs.
///
/// Each call is a single request. Ordering between calls on the same job is
/// whatever order the scheduler receives them in.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Create a job that fires after `delay_ms` milliseconds.
    async fn create_job(
        &self,
        job_id: &JobId,
        delay_ms: u64,
        job_name: &str,
        notification_template: &str,
    ) -> Result<Value, SchedulerError>;

    /// Change the delay of a pending job. `body` is sent as-is.
    async fn update_delay(&self, body: &Value) -> Result<Value, SchedulerError>;

    /// Remove a pending job. `body` is sent as-is.
    async fn remove_job(&self, body: &Value) -> Result<Value, SchedulerError>;
}

/// HTTP client for the scheduler service.
///
/// Holds no per-job state; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct SchedulerClient {
    http: Client,
    config: SchedulerConfig,
}

impl SchedulerClient {
    /// Create a client with a default HTTP client.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        let http = Client::builder().build().map_err(TransportError::Http)?;
        Ok(Self::with_http(config, http))
    }

    /// Create a client on top of an existing HTTP client.
    pub fn with_http(config: SchedulerConfig, http: Client) -> Self {
        Self { http, config }
    }

    /// Build the creation payload without sending it.
    pub fn create_job_request(
        &self,
        job_id: &JobId,
        delay_ms: u64,
        job_name: &str,
        notification_template: &str,
    ) -> CreateJobRequest {
        CreateJobRequest {
            job_name: job_name.to_string(),
            email: vec![self.config.error_reporting_email.clone()],
            request: self.config.callback_target(),
            job_options: JobOptions::single_attempt(
                job_id.clone(),
                delay_ms,
                notification_template,
            ),
        }
    }

    /// Create a job on the scheduler.
    ///
    /// Reusing a `job_id` is handled however the scheduler handles it; the
    /// client does not check.
    #[tracing::instrument(skip(self, job_id), fields(job_id = %job_id))]
    pub async fn create_job(
        &self,
        job_id: &JobId,
        delay_ms: u64,
        job_name: &str,
        notification_template: &str,
    ) -> Result<Value, SchedulerError> {
        let request = self.create_job_request(job_id, delay_ms, job_name, notification_template);
        self.post(Endpoint::CreateSchedulerJob, &request).await
    }

    /// Change the delay of a scheduled job.
    ///
    /// `body` must identify the job and carry the new delay; it is forwarded
    /// unmodified.
    #[tracing::instrument(skip_all)]
    pub async fn update_delay<B>(&self, body: &B) -> Result<Value, SchedulerError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post(Endpoint::UpdateDelay, body).await
    }

    /// Remove a scheduled job before it fires.
    ///
    /// Removing a job that already fired or was removed comes back as
    /// [`SchedulerError::Rejected`].
    #[tracing::instrument(skip_all)]
    pub async fn remove_job<B>(&self, body: &B) -> Result<Value, SchedulerError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.post(Endpoint::RemoveScheduledJob, body).await
    }

    /// Send one request and log any failure before returning it.
    async fn post<B>(&self, endpoint: Endpoint, body: &B) -> Result<Value, SchedulerError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let result = self.send(endpoint, body).await;

        match &result {
            Ok(message) => debug!(%endpoint, %message, "scheduler accepted request"),
            Err(SchedulerError::Rejected { body, .. }) => {
                error!(%endpoint, %body, "scheduler rejected request")
            }
            Err(e) => error!(%endpoint, error = %e, "scheduler request failed"),
        }

        result
    }

    async fn send<B>(&self, endpoint: Endpoint, body: &B) -> Result<Value, SchedulerError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let payload = serde_json::to_vec(body).map_err(TransportError::Encode)?;
        let url = self.config.endpoint_url(endpoint);

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(timeout) = self.config.request_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(TransportError::Http)?;

        // The scheduler reports outcomes in the body, so the status only
        // matters for diagnostics.
        let status = response.status();
        let bytes = response.bytes().await.map_err(TransportError::Http)?;

        let decoded: Value =
            serde_json::from_slice(&bytes).map_err(|e| TransportError::MalformedResponse {
                status: status.as_u16(),
                reason: format!("body is not JSON: {}", e),
            })?;

        match SchedulerResponse::interpret(decoded) {
            Some(SchedulerResponse::Accepted { message }) => Ok(message),
            Some(SchedulerResponse::Rejected { body }) => {
                Err(SchedulerError::Rejected { endpoint, body })
            }
            None => Err(TransportError::MalformedResponse {
                status: status.as_u16(),
                reason: "missing boolean `success` field".to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl JobScheduler for SchedulerClient {
    async fn create_job(
        &self,
        job_id: &JobId,
        delay_ms: u64,
        job_name: &str,
        notification_template: &str,
    ) -> Result<Value, SchedulerError> {
        SchedulerClient::create_job(self, job_id, delay_ms, job_name, notification_template).await
    }

    async fn update_delay(&self, body: &Value) -> Result<Value, SchedulerError> {
        SchedulerClient::update_delay(self, body).await
    }

    async fn remove_job(&self, body: &Value) -> Result<Value, SchedulerError> {
        SchedulerClient::remove_job(self, body).await
    }
}

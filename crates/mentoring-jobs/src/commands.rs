//! Subcommand execution against a [`JobScheduler`].

use miette::Result;
use serde_json::Value;
use tracing::info;

use mentoring_scheduler::{DelayUpdate, JobId, JobRemoval, JobScheduler, SchedulerError};

/// A lifecycle operation ready to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create {
        job_id: JobId,
        delay_ms: u64,
        job_name: String,
        template: String,
    },
    UpdateDelay(Value),
    Remove(Value),
}

/// Body for `update-delay`: either raw JSON or built from flags.
pub fn update_delay_body(
    job_id: Option<JobId>,
    delay_ms: Option<u64>,
    raw: Option<&str>,
) -> Result<Value> {
    match (raw, job_id, delay_ms) {
        (Some(raw), _, _) => parse_raw_body(raw),
        (None, Some(job_id), Some(delay)) => to_value(&DelayUpdate { job_id, delay }),
        _ => Err(miette::miette!(
            "update-delay needs either --body or both --job-id and --delay-ms"
        )),
    }
}

/// Body for `remove`: either raw JSON or built from `--job-id`.
pub fn remove_body(job_id: Option<JobId>, raw: Option<&str>) -> Result<Value> {
    match (raw, job_id) {
        (Some(raw), _) => parse_raw_body(raw),
        (None, Some(job_id)) => to_value(&JobRemoval { job_id }),
        (None, None) => Err(miette::miette!("remove needs either --body or --job-id")),
    }
}

fn parse_raw_body(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| miette::miette!("--body is not valid JSON: {}", e))?;
    if !value.is_object() {
        return Err(miette::miette!("--body must be a JSON object"));
    }
    Ok(value)
}

fn to_value<T: serde::Serialize>(body: &T) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| miette::miette!("failed to encode body: {}", e))
}

/// Run one operation and turn scheduler failures into reports.
pub async fn execute(scheduler: &dyn JobScheduler, operation: Operation) -> Result<Value> {
    let result = match &operation {
        Operation::Create {
            job_id,
            delay_ms,
            job_name,
            template,
        } => {
            info!(%job_id, delay_ms, %job_name, "creating job");
            scheduler
                .create_job(job_id, *delay_ms, job_name, template)
                .await
        }
        Operation::UpdateDelay(body) => {
            info!(%body, "updating job delay");
            scheduler.update_delay(body).await
        }
        Operation::Remove(body) => {
            info!(%body, "removing job");
            scheduler.remove_job(body).await
        }
    };

    result.map_err(|e| match e {
        SchedulerError::Rejected { endpoint, body } => {
            miette::miette!("scheduler rejected {}: {}", endpoint, body)
        }
        SchedulerError::Transport(e) => miette::miette!("could not reach scheduler: {}", e),
    })
}

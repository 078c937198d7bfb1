//! mentoring-jobs: operator CLI for scheduled notification jobs
//!
//! Subcommands:
//! - `create`: schedule a notification job
//! - `update-delay`: change when a pending job fires
//! - `remove`: cancel a pending job

use clap::{Args, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mentoring_scheduler::{
    APPLICATION_PORT_VAR, CALLBACK_HOST_VAR, ERROR_REPORTING_EMAIL_VAR, INTERNAL_ACCESS_TOKEN_VAR,
    JobId, REQUEST_TIMEOUT_MS_VAR, SERVICE_BASE_URL_VAR, SERVICE_HOST_VAR, SchedulerClient,
    SchedulerConfig,
};

mod commands;

use commands::Operation;

#[derive(Parser)]
#[command(name = "mentoring-jobs")]
#[command(about = "Manage scheduled notification jobs", long_about = None)]
struct Cli {
    #[command(flatten)]
    scheduler: SchedulerArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection and callback settings, normally taken from the environment.
///
/// Values are handed to [`SchedulerConfig::from_lookup`] so the CLI and
/// embedding services share one set of parsing rules.
#[derive(Args)]
struct SchedulerArgs {
    /// Scheduler service host
    #[arg(long, env = SERVICE_HOST_VAR)]
    scheduler_host: Option<String>,

    /// Scheduler service base path, appended to the host
    #[arg(long, env = SERVICE_BASE_URL_VAR)]
    scheduler_base_url: Option<String>,

    /// Address that receives scheduler-side failure reports
    #[arg(long, env = ERROR_REPORTING_EMAIL_VAR)]
    error_reporting_email: Option<String>,

    /// Shared secret the scheduler sends back on job callbacks
    #[arg(long, env = INTERNAL_ACCESS_TOKEN_VAR, hide_env_values = true)]
    internal_access_token: Option<String>,

    /// Port of the service receiving job callbacks
    #[arg(long, env = APPLICATION_PORT_VAR)]
    application_port: Option<String>,

    /// Host of the service receiving job callbacks [default: localhost]
    #[arg(long, env = CALLBACK_HOST_VAR)]
    callback_host: Option<String>,

    /// Per-request timeout in milliseconds (HTTP client default if unset)
    #[arg(long, env = REQUEST_TIMEOUT_MS_VAR)]
    request_timeout_ms: Option<String>,
}

impl SchedulerArgs {
    fn lookup(&self, var: &str) -> Option<String> {
        let value = match var {
            SERVICE_HOST_VAR => &self.scheduler_host,
            SERVICE_BASE_URL_VAR => &self.scheduler_base_url,
            ERROR_REPORTING_EMAIL_VAR => &self.error_reporting_email,
            INTERNAL_ACCESS_TOKEN_VAR => &self.internal_access_token,
            APPLICATION_PORT_VAR => &self.application_port,
            CALLBACK_HOST_VAR => &self.callback_host,
            REQUEST_TIMEOUT_MS_VAR => &self.request_timeout_ms,
            _ => return None,
        };
        value.clone()
    }

    fn to_config(&self) -> Result<SchedulerConfig> {
        SchedulerConfig::from_lookup(|var| self.lookup(var))
            .map_err(|e| miette::miette!("invalid scheduler configuration: {}", e))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a notification job
    Create {
        /// Unique job identifier
        #[arg(long)]
        job_id: JobId,

        /// Milliseconds until the job fires
        #[arg(long)]
        delay_ms: u64,

        /// Job classification, e.g. "session-reminder"
        #[arg(long)]
        job_name: String,

        /// Email template the notification renderer should use
        #[arg(long)]
        template: String,
    },

    /// Change the delay of a pending job
    UpdateDelay {
        /// Job identifier
        #[arg(long, required_unless_present = "body", requires = "delay_ms")]
        job_id: Option<JobId>,

        /// New delay in milliseconds
        #[arg(long, requires = "job_id")]
        delay_ms: Option<u64>,

        /// Raw JSON body sent to the scheduler as-is
        #[arg(long, conflicts_with_all = ["job_id", "delay_ms"])]
        body: Option<String>,
    },

    /// Cancel a pending job
    Remove {
        /// Job identifier
        #[arg(long, required_unless_present = "body")]
        job_id: Option<JobId>,

        /// Raw JSON body sent to the scheduler as-is
        #[arg(long, conflicts_with = "job_id")]
        body: Option<String>,
    },
}

impl Commands {
    fn into_operation(self) -> Result<Operation> {
        match self {
            Commands::Create {
                job_id,
                delay_ms,
                job_name,
                template,
            } => Ok(Operation::Create {
                job_id,
                delay_ms,
                job_name,
                template,
            }),
            Commands::UpdateDelay {
                job_id,
                delay_ms,
                body,
            } => Ok(Operation::UpdateDelay(commands::update_delay_body(
                job_id,
                delay_ms,
                body.as_deref(),
            )?)),
            Commands::Remove { job_id, body } => Ok(Operation::Remove(commands::remove_body(
                job_id,
                body.as_deref(),
            )?)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "mentoring_jobs=info,mentoring_scheduler=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = cli.scheduler.to_config()?;
    tracing::debug!(?config, "scheduler configuration");

    let operation = cli.command.into_operation()?;

    let client = SchedulerClient::new(config)
        .map_err(|e| miette::miette!("failed to build scheduler client: {}", e))?;

    let message = commands::execute(&client, operation).await?;

    let rendered = serde_json::to_string_pretty(&message)
        .map_err(|e| miette::miette!("failed to render scheduler message: {}", e))?;
    println!("{}", rendered);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SCHEDULER_FLAGS: &[&str] = &[
        "mentoring-jobs",
        "--scheduler-host",
        "http://scheduler:4000",
        "--error-reporting-email",
        "ops@example.com",
        "--internal-access-token",
        "s3cret",
        "--application-port",
        "3569",
    ];

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(SCHEDULER_FLAGS.iter().chain(args))
    }

    fn operation(args: &[&str]) -> Operation {
        parse(args).unwrap().command.into_operation().unwrap()
    }

    #[test]
    fn test_update_delay_from_flags() {
        assert_eq!(
            operation(&["update-delay", "--job-id", "job-42", "--delay-ms", "120000"]),
            Operation::UpdateDelay(json!({"jobId": "job-42", "delay": 120000}))
        );
    }

    #[test]
    fn test_update_delay_requires_both_flags() {
        assert!(parse(&["update-delay", "--job-id", "job-42"]).is_err());
        assert!(parse(&["update-delay", "--delay-ms", "120000"]).is_err());
        assert!(parse(&["update-delay"]).is_err());
    }

    #[test]
    fn test_update_delay_body_conflicts_with_flags() {
        assert!(parse(&["update-delay", "--body", "{}", "--job-id", "job-42"]).is_err());
        assert!(parse(&["update-delay", "--body", "{}", "--delay-ms", "5"]).is_err());
        assert_eq!(
            operation(&["update-delay", "--body", r#"{"jobId": "job-42", "delay": 5}"#]),
            Operation::UpdateDelay(json!({"jobId": "job-42", "delay": 5}))
        );
    }

    #[test]
    fn test_remove_rules() {
        assert!(parse(&["remove"]).is_err());
        assert!(parse(&["remove", "--job-id", "job-42", "--body", "{}"]).is_err());
        assert_eq!(
            operation(&["remove", "--job-id", "job-42"]),
            Operation::Remove(json!({"jobId": "job-42"}))
        );
    }

    #[test]
    fn test_create_rejects_empty_job_id() {
        assert!(
            parse(&[
                "create",
                "--job-id",
                "",
                "--delay-ms",
                "1000",
                "--job-name",
                "session-reminder",
                "--template",
                "tmpl-1"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_scheduler_args_build_config() {
        let cli = parse(&[
            "--scheduler-base-url",
            "/scheduler",
            "--request-timeout-ms",
            "2500",
            "remove",
            "--job-id",
            "job-42",
        ])
        .unwrap();
        let config = cli.scheduler.to_config().unwrap();

        assert_eq!(config.service_url, "http://scheduler:4000/scheduler");
        assert_eq!(config.application_port, 3569);
        assert_eq!(config.callback_host, "localhost");
        assert_eq!(
            config.request_timeout,
            Some(std::time::Duration::from_millis(2500))
        );
    }

    #[test]
    fn test_scheduler_args_invalid_port() {
        let cli = Cli::try_parse_from([
            "mentoring-jobs",
            "--scheduler-host",
            "http://scheduler:4000",
            "--error-reporting-email",
            "ops@example.com",
            "--internal-access-token",
            "s3cret",
            "--application-port",
            "not-a-port",
            "remove",
            "--job-id",
            "job-42",
        ])
        .unwrap();

        assert!(cli.scheduler.to_config().is_err());
    }
}

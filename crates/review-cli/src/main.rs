//! Command-line front end: plain upload or streamed workflow run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use review_client::render::{render_session, render_upload};
use review_client::{
    ClientConfig, FileType, HttpWorkflowClient, LogConfig, RunState, Selector, UploadConfig,
    UploadForm, UploadOutcome, WorkflowKind, init_observability,
};
use tracing::warn;

#[derive(Parser)]
#[command(name = "investments-review", about = "Review investment sheets and presentations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Log filter directive, e.g. `debug` or `review_client=trace`.
    #[arg(long, global = true, env = "REVIEW_LOG_LEVEL")]
    log_level: Option<String>,
    /// Write JSONL logs to this file instead of stderr.
    #[arg(long, global = true, env = "REVIEW_JSON_LOG_PATH")]
    log_json: Option<PathBuf>,
    /// Disable logging.
    #[arg(long, global = true)]
    no_logs: bool,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: !self.no_logs,
            filter: self.log_level.clone(),
            json_path: self.log_json.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Upload a file to the review server and print the final result.
    Upload {
        /// File to upload.
        #[arg(long)]
        file: Option<PathBuf>,
        /// File type: sheet or presentation.
        #[arg(long = "type")]
        file_type: Option<FileType>,
        /// Server hosting the upload routes.
        #[arg(long, env = "REVIEW_SERVER_URL", default_value = "http://localhost:8000")]
        server: String,
        /// Request timeout in seconds.
        #[arg(long, default_value_t = 600)]
        timeout_secs: u64,
    },
    /// Start a workflow run on a deployment and stream its events.
    Run {
        /// Workflow: sheets or presentations.
        #[arg(long)]
        workflow: WorkflowKind,
        /// File to review.
        #[arg(long)]
        file: PathBuf,
        /// Deployment name (defaults to LLAMA_DEPLOY_DEPLOYMENT_NAME).
        #[arg(long)]
        deployment: Option<String>,
        /// API origin (defaults to LLAMA_DEPLOY_API_ORIGIN or http://localhost:4501).
        #[arg(long)]
        api_origin: Option<String>,
        /// Query the handler status once the stream ends.
        #[arg(long)]
        follow_status: bool,
    },
}

fn client_config(
    deployment: Option<String>,
    api_origin: Option<String>,
) -> Result<ClientConfig, review_client::ClientError> {
    let mut config = match deployment {
        Some(name) => {
            let mut config = ClientConfig::new(name);
            if let Ok(origin) = std::env::var(review_client::config::API_ORIGIN_ENV) {
                config = config.api_origin(origin);
            }
            config
        }
        None => ClientConfig::from_env()?,
    };
    if let Some(origin) = api_origin {
        config = config.api_origin(origin);
    }
    config.validate()?;
    Ok(config)
}

/// Returns whether the server produced a final result.
async fn upload(
    file: Option<PathBuf>,
    file_type: Option<FileType>,
    server: String,
    timeout_secs: u64,
) -> Result<bool, Box<dyn std::error::Error>> {
    let config = UploadConfig::new(server).timeout(Duration::from_secs(timeout_secs));
    let form = UploadForm::new(file, file_type);
    let outcome = form.submit(&config).await?;
    match &outcome {
        UploadOutcome::Completed { .. } => print!("{}", render_upload(&outcome)),
        UploadOutcome::Failed { .. } => eprint!("{}", render_upload(&outcome)),
    }
    Ok(outcome.is_completed())
}

async fn run(
    workflow: WorkflowKind,
    file: &Path,
    config: ClientConfig,
    follow_status: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let client = HttpWorkflowClient::new(config)?;
    let mut selector = Selector::new();
    selector.set_workflow(Some(workflow));
    selector.select_file(Some(file)).await?;
    if !selector.file_matches_filter() {
        warn!(
            path = %file.display(),
            accept = selector.accept_filter(),
            "file does not match the workflow's accepted extensions"
        );
    }

    let Some(mut session) = selector.mount(client) else {
        return Err("a workflow and a file are both required".into());
    };
    println!("Running {}", session.workflow_name());
    let handler = session.start().await?.clone();
    println!("Handler: {handler}");

    let state = session
        .follow(|event| println!("> {}", event.display_line()))
        .await?;
    if follow_status && state != RunState::Completed {
        session.refresh_status().await?;
    }
    println!();
    print!("{}", render_session(&session));
    if state != RunState::Completed {
        eprintln!(
            "event stream ended before the run completed (status: {})",
            session.status_label()
        );
    }
    Ok(state == RunState::Completed)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(err) = init_observability(&cli.log_config()) {
        eprintln!("An error occurred: {err}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Command::Upload {
            file,
            file_type,
            server,
            timeout_secs,
        } => upload(file, file_type, server, timeout_secs).await,
        Command::Run {
            workflow,
            file,
            deployment,
            api_origin,
            follow_status,
        } => match client_config(deployment, api_origin) {
            Ok(config) => run(workflow, &file, config, follow_status).await,
            Err(err) => Err(err.into()),
        },
    };
    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("An error occurred: {err}");
            std::process::exit(1);
        }
    }
}

//! tickerviz command-line entry point
//!
//! One free-text query in, the final artifact (code, status, errors) or a
//! terminal error out. Environment is loaded from `.env` when present;
//! `TICKERVIZ_OLLAMA_URL` and `TICKERVIZ_MODEL` override the defaults.

use anyhow::Context;
use clap::Parser;
use std::num::NonZeroU32;
use std::process::ExitCode;
use std::time::Duration;
use tickerviz_core::{Pipeline, PipelineConfig, PipelineError};
use tickerviz_inference::OllamaBackend;
use tickerviz_sandbox::SubprocessSandbox;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tickerviz", version, about = "Verified financial-data visualization")]
struct Cli {
    /// Free-text query, e.g. "Plot YTD stock gain of Google"
    query: String,

    /// Model name served by the backend
    #[arg(long)]
    model: Option<String>,

    /// Backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Total synthesis attempts permitted (first + repairs)
    #[arg(long, default_value = "3")]
    max_attempts: NonZeroU32,

    /// Interpretation retries after a schema violation
    #[arg(long, default_value_t = 2)]
    interpreter_retries: u32,

    /// Sandbox wall-clock ceiling per execution, in seconds
    #[arg(long, default_value_t = 60)]
    sandbox_time_limit: u64,

    /// Python interpreter used by the sandbox
    #[arg(long, default_value = "python3")]
    interpreter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_url = cli
        .base_url
        .or_else(|| std::env::var("TICKERVIZ_OLLAMA_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:11434".to_string());
    let model = cli
        .model
        .or_else(|| std::env::var("TICKERVIZ_MODEL").ok())
        .unwrap_or_else(|| "llama3.1".to_string());

    let config = PipelineConfig::new()
        .with_max_attempts(cli.max_attempts)
        .with_interpreter_retries(cli.interpreter_retries)
        .with_sandbox_time_limit(Duration::from_secs(cli.sandbox_time_limit));

    let backend = OllamaBackend::new(&base_url, &model, config.backend_timeout())
        .context("failed to construct model backend")?;
    let sandbox = SubprocessSandbox::new(&cli.interpreter, config.sandbox_time_limit());

    let pipeline = Pipeline::new(backend, sandbox, config);

    match pipeline.run(&cli.query).await {
        Ok(artifact) => {
            println!("{}", artifact.code);
            eprintln!("status: {} (attempt {})", artifact.status, artifact.attempt);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            if let Some(artifact) = err.last_artifact() {
                eprintln!("status: {} (attempt {})", artifact.status, artifact.attempt);
                for (i, diagnostic) in artifact.errors.iter().enumerate() {
                    eprintln!("attempt {}: {diagnostic}", i + 1);
                }
            }
            if let PipelineError::Interpretation(source) = &err {
                eprintln!("could not interpret the query: {source}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

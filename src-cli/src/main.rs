use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use psum_ai::client::ProviderClient;
use psum_ai::Summarizer;
use psum_core::config::{self, Config};
use psum_core::error::AppError;
use tracing_subscriber::EnvFilter;

/// Summarize a podcast transcript into formatted HTML notes.
#[derive(Debug, Parser)]
#[command(name = "podsummary", version, about)]
struct Cli {
    /// Transcript document (PDF or plain text).
    #[arg(long, required_unless_present = "check")]
    input: Option<PathBuf>,

    /// Where to write the HTML notes. Defaults to `output.path` from the config.
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check provider connectivity and the example corpus, then exit.
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cfg = match cli.config.as_deref() {
        Some(path) => config::load(path),
        None => Ok(Config::default()),
    };
    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => return report(&e),
    };
    init_logging(&cfg.service.log_level);

    match run(&cli, &cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, cfg: &Config) -> Result<(), AppError> {
    if cli.check {
        return check(cfg);
    }

    let input = cli
        .input
        .as_deref()
        .ok_or_else(|| AppError::new("CONFIG_INVALID", "--input is required"))?;
    let output = cli.output.clone().unwrap_or_else(|| cfg.output.path.clone());

    let summarizer = Summarizer::from_config(cfg)?;
    let html = summarizer.summarize(input, &output)?;
    println!("{html}");
    Ok(())
}

fn check(cfg: &Config) -> Result<(), AppError> {
    let client = ProviderClient::from_config(&cfg.provider)?;
    client.health_check()?;

    let summarizer = Summarizer::from_client(cfg, client);
    summarizer.warm_examples()?;

    let status = serde_json::json!({
        "provider": cfg.provider.api_base,
        "chat_model": cfg.provider.chat_model,
        "examples": summarizer.examples().status(),
    });
    let text = serde_json::to_string_pretty(&status).map_err(|e| {
        AppError::new("CONFIG_INVALID", "Failed to encode status").with_details(e.to_string())
    })?;
    println!("{text}");
    Ok(())
}

fn report(e: &AppError) -> ExitCode {
    eprintln!("error [{}]: {}", e.code, e.message);
    if let Some(details) = &e.details {
        eprintln!("  details: {details}");
    }
    ExitCode::FAILURE
}

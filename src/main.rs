use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod corpus;
mod error;
mod gemini;
mod generate;
mod pipeline;
mod prompt;
mod record;
mod retry;

use cli::{Command, GenerateArgs, PayloadArgs, RootArgs};
use config::{ConfigLayer, GeneratorConfig};

fn main() -> Result<()> {
    let args = RootArgs::parse();

    match args.command {
        Command::Generate(args) => cmd_generate(&args),
        Command::Payload(args) => cmd_payload(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "gamedex=debug"
    } else {
        "gamedex=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

/// Merge CLI flags over the optional config file and read the credential.
fn resolve_config(
    cli_layer: ConfigLayer,
    config_path: Option<&std::path::Path>,
) -> Result<GeneratorConfig> {
    let file_layer = match config_path {
        Some(path) => config::load_config_file(path)?,
        None => ConfigLayer::default(),
    };
    let config = config::resolve(cli_layer.or(file_layer), |name| std::env::var(name).ok())?;
    Ok(config)
}

fn cmd_generate(args: &GenerateArgs) -> Result<()> {
    init_tracing(args.verbose);
    let config = resolve_config(args.layer(), args.corpus.config.as_deref())?;
    tracing::debug!(?config, "resolved configuration");

    let transport = gemini::UreqTransport::new(config.timeout);
    let report = pipeline::run_pipeline(&config, &transport, &retry::ThreadSleeper)?;
    println!(
        "Updated {}: {} records ({} existing + {} new after {} attempt{}).",
        report.path.display(),
        report.total,
        report.previous,
        report.generated,
        report.attempts,
        if report.attempts == 1 { "" } else { "s" }
    );
    Ok(())
}

fn cmd_payload(args: &PayloadArgs) -> Result<()> {
    init_tracing(false);
    let config = resolve_config(args.corpus.layer(), args.corpus.config.as_deref())?;
    let existing = corpus::load_corpus(&config.data_path).map_err(|source| {
        error::PipelineError::CorpusRead {
            path: config.data_path.clone(),
            source,
        }
    })?;
    let body = generate::request_body(&existing, config.batch_size);
    let text = serde_json::to_string_pretty(&body).context("serialize request body")?;
    println!("{text}");
    Ok(())
}

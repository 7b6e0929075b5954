//! CLI argument parsing for the catalog generator.
//!
//! Flags map one-to-one onto a `ConfigLayer` so the same precedence rules
//! apply whether a value comes from the command line or a config file.
use crate::config::ConfigLayer;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "gamedex",
    version,
    about = "Grow a JSON game catalog with LM-generated records",
    after_help = "Commands:\n  generate --data <file>  Append a generated batch to the corpus\n  payload --data <file>   Print the request body generate would send\n\nEnvironment:\n  GEMINI_API_KEY          Service credential (name configurable with --api-key-env)\n  RUST_LOG                Log filter (default gamedex=info)\n\nExamples:\n  gamedex generate\n  gamedex generate --data site/data.json --count 10\n  gamedex payload --data site/data.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Generate(GenerateArgs),
    Payload(PayloadArgs),
}

/// Settings shared by every command that touches the corpus.
#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Corpus JSON file (default data.json)
    #[arg(long, value_name = "PATH")]
    pub data: Option<PathBuf>,

    /// Records to request per batch (default 25)
    #[arg(long, value_name = "N")]
    pub count: Option<usize>,

    /// JSON config file with default settings
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Generate command inputs.
#[derive(Parser, Debug)]
#[command(about = "Generate a batch of records and append it to the corpus")]
pub struct GenerateArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Attempts before giving up (default 5)
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Backoff unit in milliseconds; attempt k waits unit * 2^k (default 1000)
    #[arg(long, value_name = "MS")]
    pub backoff_unit_ms: Option<u64>,

    /// Model identifier
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// Service base URL
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Environment variable holding the API key (default GEMINI_API_KEY)
    #[arg(long, value_name = "VAR")]
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Emit debug-level logs
    #[arg(long)]
    pub verbose: bool,
}

/// Payload command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the request body for the next batch without sending it")]
pub struct PayloadArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

impl GenerateArgs {
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            max_attempts: self.max_attempts,
            backoff_unit_ms: self.backoff_unit_ms,
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            api_key_env: self.api_key_env.clone(),
            timeout_secs: self.timeout_secs,
            ..self.corpus.layer()
        }
    }
}

impl CorpusArgs {
    pub fn layer(&self) -> ConfigLayer {
        ConfigLayer {
            data: self.data.clone(),
            count: self.count,
            ..ConfigLayer::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_flags_fill_a_config_layer() {
        let args = RootArgs::try_parse_from([
            "gamedex",
            "generate",
            "--data",
            "site/data.json",
            "--count",
            "10",
            "--max-attempts",
            "3",
            "--backoff-unit-ms",
            "5",
        ])
        .expect("parse args");
        let Command::Generate(args) = args.command else {
            panic!("expected generate command");
        };
        let layer = args.layer();
        assert_eq!(layer.data, Some(PathBuf::from("site/data.json")));
        assert_eq!(layer.count, Some(10));
        assert_eq!(layer.max_attempts, Some(3));
        assert_eq!(layer.backoff_unit_ms, Some(5));
        assert_eq!(layer.model, None);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(RootArgs::try_parse_from(["gamedex"]).is_err());
    }
}

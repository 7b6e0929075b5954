//! Load, generate, append, write: one strictly sequential run.
//!
//! Any error leaves the stored corpus as it was; the run is never retried as
//! a whole.
use crate::config::GeneratorConfig;
use crate::corpus::{append_records, load_corpus, write_corpus};
use crate::error::PipelineError;
use crate::gemini::Transport;
use crate::generate::{generate_batch, BatchRequest};
use crate::retry::Sleeper;
use std::path::PathBuf;

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub path: PathBuf,
    pub previous: usize,
    pub generated: usize,
    pub total: usize,
    pub attempts: u32,
}

pub fn run_pipeline(
    config: &GeneratorConfig,
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
) -> Result<PipelineReport, PipelineError> {
    let api_key = config.api_key.as_ref().ok_or_else(|| {
        PipelineError::Configuration(format!(
            "environment variable {} is not set",
            config.api_key_env
        ))
    })?;

    let path = &config.data_path;
    let existing = load_corpus(path).map_err(|source| PipelineError::CorpusRead {
        path: path.clone(),
        source,
    })?;
    let previous = existing.len();

    let url = config.endpoint();
    let request = BatchRequest {
        url: &url,
        api_key: api_key.expose(),
        batch_size: config.batch_size,
        retry: config.retry,
    };
    tracing::info!(
        model = %config.model,
        batch_size = config.batch_size,
        existing = previous,
        "generating batch"
    );
    let batch = generate_batch(transport, sleeper, &request, &existing)?;
    let generated = batch.records.len();

    let combined = append_records(existing, batch.records);
    write_corpus(path, &combined).map_err(|source| PipelineError::CorpusWrite {
        path: path.clone(),
        source,
    })?;

    Ok(PipelineReport {
        path: path.clone(),
        previous,
        generated,
        total: combined.len(),
        attempts: batch.attempts,
    })
}

//! Error taxonomy for the generation pipeline.
//!
//! `AttemptError` is recoverable and only ever seen by the retry loop.
//! Everything in `PipelineError` is fatal and reaches the operator.
use std::path::PathBuf;

/// Why a single request/validate cycle failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("API request failed with status {status}: {status_text}")]
    ApiStatus { status: u16, status_text: String },

    #[error("API response has no text content")]
    EmptyResponse,

    #[error("{what} is not valid JSON: {source}")]
    MalformedJson {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}", count_mismatch_message(.expected, .actual))]
    CountMismatch {
        expected: usize,
        actual: Option<usize>,
    },
}

fn count_mismatch_message(expected: &usize, actual: &Option<usize>) -> String {
    match actual {
        Some(actual) => format!("expected an array of {expected} items, found {actual}"),
        None => format!("expected an array of {expected} items, found a non-array value"),
    }
}

/// Why the stored corpus could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum CorpusReadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a top-level JSON array, found {found}")]
    NotArray { found: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load corpus {}", .path.display())]
    CorpusRead {
        path: PathBuf,
        #[source]
        source: CorpusReadError,
    },

    #[error("generation failed after {attempts} attempts")]
    GenerationExhausted {
        attempts: u32,
        #[source]
        last: AttemptError,
    },

    #[error("failed to write corpus {}", .path.display())]
    CorpusWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

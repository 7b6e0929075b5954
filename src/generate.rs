//! Generation client: one validated batch of new records per call.
use crate::error::{AttemptError, PipelineError};
use crate::gemini::{self, GenerateRequest, Transport};
use crate::prompt::build_prompts;
use crate::record;
use crate::retry::{run_with_retry, RetryOutcome, RetryPolicy, Sleeper};
use serde_json::Value;

/// Where and how to ask for a batch.
pub struct BatchRequest<'a> {
    pub url: &'a str,
    pub api_key: &'a str,
    pub batch_size: usize,
    pub retry: RetryPolicy,
}

/// A batch that passed validation, with the attempt that produced it.
#[derive(Debug)]
pub struct GeneratedBatch {
    pub records: Vec<Value>,
    pub attempts: u32,
}

/// Request body for a batch of `batch_size` records avoiding `existing` names.
pub fn request_body(existing: &[Value], batch_size: usize) -> Value {
    let excluded = record::corpus_names(existing);
    let prompts = build_prompts(batch_size, &excluded);
    gemini::build_request_body(&prompts)
}

/// Ask the service for exactly `batch_size` new records, retrying with backoff.
pub fn generate_batch(
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
    request: &BatchRequest<'_>,
    existing: &[Value],
) -> Result<GeneratedBatch, PipelineError> {
    let body = request_body(existing, request.batch_size);
    let http = GenerateRequest {
        url: request.url,
        api_key: request.api_key,
        body: &body,
    };

    let outcome = run_with_retry(&request.retry, sleeper, |_| {
        let reply = transport
            .post_json(&http)
            .map_err(AttemptError::Transport)?;
        validate_reply(&reply, request.batch_size)
    });

    match outcome {
        RetryOutcome::Succeeded { value, attempts } => {
            report_batch_quality(existing, &value);
            Ok(GeneratedBatch {
                records: value,
                attempts,
            })
        }
        RetryOutcome::Exhausted { last, attempts } => {
            Err(PipelineError::GenerationExhausted { attempts, last })
        }
    }
}

/// Classify one reply; `Ok` only for an array of exactly `expected` items.
pub fn validate_reply(
    reply: &gemini::HttpReply,
    expected: usize,
) -> Result<Vec<Value>, AttemptError> {
    if !reply.is_success() {
        return Err(AttemptError::ApiStatus {
            status: reply.status,
            status_text: reply.status_text.clone(),
        });
    }
    let text = gemini::extract_text(&reply.body)
        .map_err(|source| AttemptError::MalformedJson {
            what: "response envelope",
            source,
        })?
        .ok_or(AttemptError::EmptyResponse)?;
    let payload: Value =
        serde_json::from_str(&text).map_err(|source| AttemptError::MalformedJson {
            what: "generated text",
            source,
        })?;
    match payload {
        Value::Array(items) if items.len() == expected => Ok(items),
        Value::Array(items) => Err(AttemptError::CountMismatch {
            expected,
            actual: Some(items.len()),
        }),
        _ => Err(AttemptError::CountMismatch {
            expected,
            actual: None,
        }),
    }
}

// Uniqueness and shape are prompt-enforced only; surface violations without
// rejecting the batch.
fn report_batch_quality(existing: &[Value], batch: &[Value]) {
    let collisions = record::colliding_names(existing, batch);
    if !collisions.is_empty() {
        tracing::warn!(
            count = collisions.len(),
            names = %collisions.join(", "),
            "generated names already present in corpus"
        );
    }
    let nonconforming = record::nonconforming_count(batch);
    if nonconforming > 0 {
        tracing::warn!(count = nonconforming, "generated records missing required fields");
    }
}

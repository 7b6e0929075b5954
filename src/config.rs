//! Generator configuration.
//!
//! Settings come from three layers: CLI flags, an optional JSON config file,
//! then built-in defaults. The credential is the only value read from the
//! environment, and only here.
use crate::error::PipelineError;
use crate::gemini::endpoint_url;
use crate::retry::{RetryPolicy, DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATA_PATH: &str = "data.json";
pub const DEFAULT_BATCH_SIZE: usize = 25;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// One layer of optional settings; also the config file format.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default)]
    pub data: Option<PathBuf>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub backoff_unit_ms: Option<u64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConfigLayer {
    /// Fill unset fields from `lower`.
    pub fn or(self, lower: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            data: self.data.or(lower.data),
            count: self.count.or(lower.count),
            max_attempts: self.max_attempts.or(lower.max_attempts),
            backoff_unit_ms: self.backoff_unit_ms.or(lower.backoff_unit_ms),
            model: self.model.or(lower.model),
            api_base: self.api_base.or(lower.api_base),
            api_key_env: self.api_key_env.or(lower.api_key_env),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
        }
    }
}

/// Load a JSON config file.
pub fn load_config_file(path: &Path) -> Result<ConfigLayer, PipelineError> {
    let bytes = fs::read(path).map_err(|err| {
        PipelineError::Configuration(format!("read config {}: {err}", path.display()))
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        PipelineError::Configuration(format!("parse config {}: {err}", path.display()))
    })
}

/// Service credential; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Everything the pipeline needs, resolved up front.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub data_path: PathBuf,
    pub batch_size: usize,
    pub retry: RetryPolicy,
    pub model: String,
    pub api_base: String,
    pub api_key_env: String,
    pub api_key: Option<ApiKey>,
    pub timeout: Option<Duration>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: None,
            timeout: None,
        }
    }
}

impl GeneratorConfig {
    pub fn endpoint(&self) -> String {
        endpoint_url(&self.api_base, &self.model)
    }
}

/// Apply defaults, validate, and look up the credential with `lookup_env`.
///
/// A missing credential is not an error here; the pipeline refuses to run
/// without one so that commands which never call the service still work.
pub fn resolve<F>(layer: ConfigLayer, lookup_env: F) -> Result<GeneratorConfig, PipelineError>
where
    F: Fn(&str) -> Option<String>,
{
    let batch_size = layer.count.unwrap_or(DEFAULT_BATCH_SIZE);
    if batch_size == 0 {
        return Err(PipelineError::Configuration(
            "count must be at least 1".to_string(),
        ));
    }
    let max_attempts = layer.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
    if max_attempts == 0 {
        return Err(PipelineError::Configuration(
            "max_attempts must be at least 1".to_string(),
        ));
    }
    let model = layer.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
    if model.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "model must be non-empty".to_string(),
        ));
    }
    let api_base = layer
        .api_base
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    if api_base.trim().is_empty() {
        return Err(PipelineError::Configuration(
            "api_base must be non-empty".to_string(),
        ));
    }
    let api_key_env = layer
        .api_key_env
        .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
    let api_key = lookup_env(&api_key_env)
        .filter(|value| !value.trim().is_empty())
        .map(ApiKey::new);

    Ok(GeneratorConfig {
        data_path: layer
            .data
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
        batch_size,
        retry: RetryPolicy {
            max_attempts,
            backoff_unit: layer
                .backoff_unit_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_BACKOFF_UNIT),
        },
        model,
        api_base,
        api_key_env,
        api_key,
        timeout: layer.timeout_secs.map(Duration::from_secs),
    })
}

//! Gemini `generateContent` request envelope and HTTP transport.
//!
//! The transport only moves bytes and reports the status; classifying the
//! reply is left to `generate` so every failure goes through the same retry
//! accounting.
use crate::prompt::PromptPair;
use crate::record::Record;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Raw HTTP reply, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fully resolved request for one attempt.
pub struct GenerateRequest<'a> {
    pub url: &'a str,
    pub api_key: &'a str,
    pub body: &'a Value,
}

/// Sends one request; `Err` means no HTTP reply was obtained at all.
pub trait Transport {
    fn post_json(&self, request: &GenerateRequest<'_>) -> Result<HttpReply, String>;
}

/// `generateContent` endpoint for `model` under `api_base`.
pub fn endpoint_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

/// Build the request body: both instructions plus the response schema.
pub fn build_request_body(prompts: &PromptPair) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompts.user }] }],
        "systemInstruction": { "parts": [{ "text": prompts.system }] },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema(),
        }
    })
}

/// Array-of-records schema in Gemini's OpenAPI subset.
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    for field in Record::FIELDS {
        properties.insert(field.to_string(), field_schema(field));
    }
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": Record::FIELDS,
        }
    })
}

fn field_schema(field: &str) -> Value {
    let description = match field {
        "name" => "Official name of the game.",
        "studio" => "Studio that developed the game.",
        "genres" => {
            return json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Genres the game belongs to.",
            })
        }
        "release_date" => "Release date of the game in YYYY-MM-DD format.",
        "image" => "URL of a cover image or promotional art for the game.",
        "description" => "Short description or synopsis of the game.",
        "site" => "URL of the official site of the game.",
        _ => "",
    };
    json!({ "type": "STRING", "description": description })
}

/// Pull the generated text out of the response envelope.
///
/// Returns `Ok(None)` when the envelope is JSON but carries no text.
pub fn extract_text(body: &str) -> Result<Option<String>, serde_json::Error> {
    let envelope: Value = serde_json::from_str(body)?;
    let text = envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    Ok(text)
}

/// Blocking HTTPS transport backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Transport for UreqTransport {
    fn post_json(&self, request: &GenerateRequest<'_>) -> Result<HttpReply, String> {
        let mut response = self
            .agent
            .post(request.url)
            .header("x-goog-api-key", request.api_key)
            .send_json(request.body)
            .map_err(|err| err.to_string())?;
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| format!("read response body: {err}"))?;
        tracing::debug!(
            status = status.as_u16(),
            response_bytes = body.len(),
            "generateContent reply"
        );
        Ok(HttpReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

use crate::components::events::RawDetection;
use crate::config::RecognizerConfig;
use crate::error::{recognizer_error, AppResult};
use async_trait::async_trait;
use base64::engine::{general_purpose::STANDARD, Engine};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You extract calendar events from images. Find every date or time \
in the picture together with the event it belongs to, and only report events whose date or time \
is clear. Relative days such as today or tomorrow count; estimate a time when none is printed. \
Never start a title with the word 'on'. Write each event as \
'Event: [event description] | DateTime: [date and time]' and separate events with '|||'. \
Reply with nothing when the image contains no dated events.";

const USER_PROMPT: &str = "List the events with dates or times in this image. \
Leave out anything without a clear date or time.";

/// Separator between events in a recognizer reply
pub const EVENT_SEPARATOR: &str = "|||";

lazy_static! {
    static ref EVENT_FIELD: Regex =
        Regex::new(r"(?i)Event:\s*([^|]+)").expect("event field pattern");
    static ref DATETIME_FIELD: Regex =
        Regex::new(r"(?is)DateTime:\s*(.+)$").expect("datetime field pattern");
}

/// Turns a frame into raw event candidates
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> AppResult<Vec<RawDetection>>;
}

/// Recognizer backed by an OpenAI-compatible chat-completions endpoint
pub struct OpenAiRecognizer {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiRecognizer {
    pub fn new(api_key: impl Into<String>, config: &RecognizerConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    fn request_body(&self, image: &[u8]) -> Value {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": USER_PROMPT },
                        { "type": "image_url", "image_url": { "url": data_url } }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl Recognizer for OpenAiRecognizer {
    async fn recognize(&self, image: &[u8]) -> AppResult<Vec<RawDetection>> {
        debug!("Sending {} byte frame to {}", image.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(image))
            .send()
            .await
            .map_err(|e| recognizer_error(&format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(recognizer_error(&format!(
                "service returned {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| recognizer_error(&format!("invalid response body: {}", e)))?;

        let detections = parse_detections(reply_content(&body)?);
        info!("Recognizer reported {} candidate(s)", detections.len());
        Ok(detections)
    }
}

/// Text of the first choice in a chat-completions response body
pub fn reply_content(body: &Value) -> AppResult<&str> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| recognizer_error("response has no message content"))
}

/// Parse a reply in the `Event: ... | DateTime: ...` format.
///
/// Empty and `null` replies, or replies without any `Event:` marker, mean no
/// events. Chunks lacking either field are skipped.
pub fn parse_detections(content: &str) -> Vec<RawDetection> {
    let content = content.trim();
    if content.is_empty() || content == "null" || !content.contains("Event:") {
        return Vec::new();
    }

    content
        .split(EVENT_SEPARATOR)
        .filter_map(|chunk| {
            let title = EVENT_FIELD.captures(chunk)?.get(1)?.as_str().trim();
            let when = DATETIME_FIELD.captures(chunk)?.get(1)?.as_str().trim();
            if when.is_empty() {
                return None;
            }
            Some(RawDetection::new(title, when))
        })
        .collect()
}

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{
    Candidate, ContentPart, GenerationRequest, GenerationResponse, GenerationTransport,
    ResponsePart, TransportError,
};
use crate::imaging::encode_png;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Blocking transport for the Gemini `generateContent` REST endpoint.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiTransport {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint_for(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

impl GenerationTransport for GeminiTransport {
    fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, TransportError> {
        let body = build_request_body(request)?;
        let resp = self
            .client
            .post(self.endpoint_for(model))
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&body)
            .send()
            .map_err(TransportError::Http)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let payload: WireResponse = resp.json().map_err(TransportError::Json)?;
        Ok(into_generation_response(payload))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WireRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireRequestPart {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireInlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    #[serde(alias = "mime_type", default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<WireImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<WireThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireImageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireThinkingConfig {
    include_thoughts: bool,
    thinking_level: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<WireInlineData>,
    #[serde(default)]
    thought: Option<bool>,
}

pub(crate) fn build_request_body(request: &GenerationRequest) -> Result<WireRequest, TransportError> {
    let mut parts = Vec::with_capacity(request.inputs.len());
    for input in request.inputs.iter() {
        let part = match input {
            ContentPart::Text(text) => WireRequestPart::Text { text: text.clone() },
            ContentPart::Image(image) => {
                let png = encode_png(image).map_err(TransportError::ImageEncode)?;
                WireRequestPart::InlineData {
                    inline_data: WireInlineData {
                        mime_type: String::from("image/png"),
                        data: BASE64_STANDARD.encode(png),
                    },
                }
            }
        };
        parts.push(part);
    }

    let hints = &request.hints;
    let image_config = if hints.aspect_ratio.is_some() || hints.image_size.is_some() {
        Some(WireImageConfig {
            aspect_ratio: hints.aspect_ratio.clone(),
            image_size: hints.image_size.clone(),
        })
    } else {
        None
    };
    let config = WireGenerationConfig {
        response_modalities: hints
            .response_modalities
            .iter()
            .map(|m| m.as_str())
            .collect(),
        temperature: hints.temperature,
        image_config,
        thinking_config: hints.thinking.as_ref().map(|t| WireThinkingConfig {
            include_thoughts: t.include_thoughts,
            thinking_level: t.level.clone(),
        }),
    };
    let is_empty_config = config.response_modalities.is_empty()
        && config.temperature.is_none()
        && config.image_config.is_none()
        && config.thinking_config.is_none();

    Ok(WireRequest {
        contents: vec![WireContent {
            role: "user",
            parts,
        }],
        generation_config: if is_empty_config { None } else { Some(config) },
    })
}

/// Inline payloads that are not valid base64 are kept as their raw bytes, so
/// only an extractor that actually picks that part fails to decode it.
pub(crate) fn into_generation_response(payload: WireResponse) -> GenerationResponse {
    if payload.candidates.is_empty() {
        if let Some(reason) = payload
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!(block_reason = reason, "prompt blocked by generation service");
        }
    }

    let mut direct_text = None::<String>;
    let mut candidates = Vec::with_capacity(payload.candidates.len());
    for (idx, wire) in payload.candidates.into_iter().enumerate() {
        if let Some(reason) = wire.finish_reason.as_deref() {
            tracing::debug!(candidate = idx, finish_reason = reason, "candidate finished");
        }
        let mut parts = Vec::new();
        for part in wire.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(inline) = part.inline_data {
                let data = match BASE64_STANDARD.decode(inline.data.as_bytes()) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        tracing::warn!(
                            candidate = idx,
                            error = %err,
                            "inline payload is not valid base64"
                        );
                        inline.data.into_bytes()
                    }
                };
                parts.push(ResponsePart::InlineImage {
                    mime_type: inline.mime_type,
                    data,
                });
            } else if let Some(text) = part.text {
                // The service's own aggregated text skips thought summaries.
                if idx == 0 && !part.thought.unwrap_or(false) {
                    direct_text.get_or_insert_with(String::new).push_str(text.as_str());
                }
                parts.push(ResponsePart::Text(text));
            }
        }
        candidates.push(Candidate { parts });
    }

    GenerationResponse {
        text: direct_text.filter(|v| !v.is_empty()),
        candidates,
    }
}

pub mod client;
pub mod extract;
pub mod gemini;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;

pub use client::GenerationClient;
pub use extract::{extract_image, response_text, Extraction};
pub use gemini::GeminiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationOperation {
    TryOn,
    TextToImage,
    Refine,
    BackgroundRemoval,
    Recommendation,
}

impl GenerationOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TryOn => "try_on",
            Self::TextToImage => "text_to_image",
            Self::Refine => "refine",
            Self::BackgroundRemoval => "background_removal",
            Self::Recommendation => "recommendation",
        }
    }

    /// Text-mode operations run against the text model, everything else
    /// against the image model.
    pub fn uses_text_model(self) -> bool {
        matches!(self, Self::Recommendation)
    }
}

impl fmt::Display for GenerationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseModality {
    Image,
    Text,
}

impl ResponseModality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingHints {
    pub include_thoughts: bool,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModalityHints {
    pub response_modalities: Vec<ResponseModality>,
    pub temperature: Option<f32>,
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
    pub thinking: Option<ThinkingHints>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Image(DynamicImage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub operation: GenerationOperation,
    pub inputs: Vec<ContentPart>,
    pub hints: ModalityHints,
}

impl GenerationRequest {
    pub fn image_count(&self) -> usize {
        self.inputs
            .iter()
            .filter(|part| matches!(part, ContentPart::Image(_)))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    InlineImage { mime_type: String, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationResponse {
    /// Aggregated text as exposed directly by the service, if any.
    pub text: Option<String>,
    pub candidates: Vec<Candidate>,
}

impl GenerationResponse {
    pub fn from_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            text: None,
            candidates: vec![Candidate { parts }],
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response JSON decode failed: {0}")]
    Json(#[source] reqwest::Error),
    #[error("failed to encode request image: {0}")]
    ImageEncode(#[source] image::ImageError),
    #[error("{0}")]
    Other(String),
}

/// Network boundary to the remote multimodal model.
pub trait GenerationTransport: Send + Sync + 'static {
    fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, TransportError>;
}

pub type SharedGenerationTransport = Arc<dyn GenerationTransport>;

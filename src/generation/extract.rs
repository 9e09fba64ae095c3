use image::DynamicImage;

use super::{GenerationOperation, GenerationResponse, ResponsePart};
use crate::error::{StudioError, StudioResult};

const NOTE_LOG_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub image: Option<DynamicImage>,
    /// Text parts seen before the image (or all of them when no image came back).
    pub notes: Vec<String>,
}

impl Extraction {
    pub fn is_absent(&self) -> bool {
        self.image.is_none()
    }

    pub fn last_note(&self) -> Option<&str> {
        self.notes.last().map(String::as_str)
    }
}

/// Walks the first candidate's parts in order. Text parts are collected as
/// notes and never stop the walk; the first inline image is decoded and
/// returned immediately, later parts are ignored.
pub fn extract_image(
    operation: GenerationOperation,
    response: &GenerationResponse,
) -> StudioResult<Extraction> {
    let mut extraction = Extraction::default();
    let Some(candidate) = response.candidates.first() else {
        tracing::warn!(operation = operation.as_str(), "response has no candidates");
        return Ok(extraction);
    };
    if candidate.parts.is_empty() {
        tracing::warn!(operation = operation.as_str(), "response candidate has no parts");
        return Ok(extraction);
    }

    for part in candidate.parts.iter() {
        match part {
            ResponsePart::Text(text) => {
                tracing::info!(
                    operation = operation.as_str(),
                    note = %truncate_chars(text.as_str(), NOTE_LOG_CHARS),
                    "model response note"
                );
                extraction.notes.push(text.clone());
            }
            ResponsePart::InlineImage { mime_type, data } => {
                let image = image::load_from_memory(data.as_slice())
                    .map_err(|source| StudioError::ImageDecode { operation, source })?;
                tracing::info!(
                    operation = operation.as_str(),
                    mime_type = mime_type.as_str(),
                    width = image.width(),
                    height = image.height(),
                    "image generated"
                );
                extraction.image = Some(image);
                return Ok(extraction);
            }
        }
    }

    tracing::warn!(
        operation = operation.as_str(),
        notes = extraction.notes.len(),
        "no image part in response"
    );
    Ok(extraction)
}

/// Direct aggregated text when the service exposes it, otherwise every text
/// part of every candidate joined by newlines.
pub fn response_text(response: &GenerationResponse) -> Option<String> {
    if let Some(text) = response.text.as_deref().filter(|v| !v.is_empty()) {
        return Some(text.to_string());
    }
    let aggregated = response
        .candidates
        .iter()
        .flat_map(|candidate| candidate.parts.iter())
        .filter_map(|part| match part {
            ResponsePart::Text(text) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    if aggregated.is_empty() {
        None
    } else {
        Some(aggregated.join("\n"))
    }
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

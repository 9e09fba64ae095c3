use std::path::{Path, PathBuf};

use image::DynamicImage;

use super::TryOnStudio;
use crate::error::{StudioError, StudioResult};
use crate::generation::prompts::DEFAULT_TRY_ON_INSTRUCTION;
use crate::generation::{extract_image, GenerationOperation};
use crate::imaging::{compose_preview, load_image_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryOnSource {
    Generated,
    /// Side-by-side fallback, the model returned no image.
    Preview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryOnOutcome {
    pub image: DynamicImage,
    pub source: TryOnSource,
    /// Last text note the model emitted, if any.
    pub analysis: Option<String>,
}

impl TryOnStudio {
    pub fn virtual_try_on(
        &self,
        person: DynamicImage,
        clothing: Vec<DynamicImage>,
        prompt: Option<&str>,
    ) -> StudioResult<TryOnOutcome> {
        if clothing.is_empty() {
            return Err(StudioError::InvalidRequest(String::from(
                "virtual try-on requires at least one clothing image",
            )));
        }
        let instruction = prompt
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_TRY_ON_INSTRUCTION);

        // Only the outbound copies are capped; the preview uses the originals.
        let sent_person = self.cap_input(person.clone());
        let sent_clothing = clothing
            .iter()
            .map(|img| self.cap_input(img.clone()))
            .collect::<Vec<_>>();
        tracing::info!(
            person_width = sent_person.width(),
            person_height = sent_person.height(),
            clothing = sent_clothing.len(),
            "starting virtual try-on"
        );

        let response = self
            .client
            .try_on(&sent_person, &sent_clothing, instruction)?;
        let extraction = extract_image(GenerationOperation::TryOn, &response)?;
        let analysis = extraction.last_note().map(str::to_string);

        if let Some(image) = extraction.image {
            return Ok(TryOnOutcome {
                image,
                source: TryOnSource::Generated,
                analysis,
            });
        }

        let Some(first_item) = clothing.first() else {
            return Err(StudioError::InvalidRequest(String::from(
                "virtual try-on requires at least one clothing image",
            )));
        };
        tracing::warn!("no image in try-on response, composing preview");
        Ok(TryOnOutcome {
            image: compose_preview(&person, first_item),
            source: TryOnSource::Preview,
            analysis,
        })
    }

    pub fn virtual_try_on_paths(
        &self,
        person_path: &Path,
        clothing_paths: &[PathBuf],
        prompt: Option<&str>,
    ) -> StudioResult<TryOnOutcome> {
        let person = load_image_path(person_path)?;
        let clothing = clothing_paths
            .iter()
            .map(|p| load_image_path(p.as_path()))
            .collect::<StudioResult<Vec<_>>>()?;
        self.virtual_try_on(person, clothing, prompt)
    }
}

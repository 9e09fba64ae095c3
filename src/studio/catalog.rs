use image::DynamicImage;

use super::{BackgroundRemovalOutcome, TryOnStudio};
use crate::error::{StudioError, StudioResult};
use crate::generation::{extract_image, GenerationOperation, GenerationResponse};

impl TryOnStudio {
    /// Text-to-image for a single clothing item, returned with a transparent background.
    pub fn generate_clothing_image(&self, description: &str) -> StudioResult<BackgroundRemovalOutcome> {
        let description = description.trim();
        if description.is_empty() {
            return Err(StudioError::InvalidRequest(String::from(
                "clothing description must not be empty",
            )));
        }
        tracing::info!(description, "generating clothing image");
        let response = self.client.text_to_image(description)?;
        let image = require_image(GenerationOperation::TextToImage, &response)?;
        self.remove_background(image)
    }

    pub fn refine_clothing_image(
        &self,
        prior: &DynamicImage,
        refinement: &str,
    ) -> StudioResult<BackgroundRemovalOutcome> {
        let refinement = refinement.trim();
        if refinement.is_empty() {
            return Err(StudioError::InvalidRequest(String::from(
                "refinement instruction must not be empty",
            )));
        }
        tracing::info!(refinement, "refining clothing image");
        let response = self.client.refine(prior, refinement)?;
        let image = require_image(GenerationOperation::Refine, &response)?;
        self.remove_background(image)
    }
}

fn require_image(
    operation: GenerationOperation,
    response: &GenerationResponse,
) -> StudioResult<DynamicImage> {
    extract_image(operation, response)?
        .image
        .ok_or(StudioError::EmptyGenerationResult { operation })
}

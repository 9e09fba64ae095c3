use image::DynamicImage;

use super::prompts::{
    clothing_item_prompt, refine_prompt, BACKGROUND_REMOVAL_INSTRUCTION, CLOTHING_ASPECT_RATIO,
    CLOTHING_IMAGE_SIZE, RECOMMENDATION_THINKING_LEVEL, REFINE_IMAGE_SIZE, TRY_ON_ASPECT_RATIO,
    TRY_ON_IMAGE_SIZE,
};
use super::{
    ContentPart, GenerationOperation, GenerationRequest, GenerationResponse, ModalityHints,
    ResponseModality, SharedGenerationTransport, ThinkingHints,
};
use crate::error::{StudioError, StudioResult};

#[derive(Clone)]
pub struct GenerationClient {
    transport: SharedGenerationTransport,
    image_model: String,
    text_model: String,
}

impl GenerationClient {
    pub fn new(
        transport: SharedGenerationTransport,
        image_model: impl Into<String>,
        text_model: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            image_model: image_model.into(),
            text_model: text_model.into(),
        }
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_str()
    }

    pub fn text_model(&self) -> &str {
        self.text_model.as_str()
    }

    pub fn try_on(
        &self,
        person: &DynamicImage,
        clothing: &[DynamicImage],
        instruction: &str,
    ) -> StudioResult<GenerationResponse> {
        self.generate(try_on_request(person, clothing, instruction))
    }

    pub fn text_to_image(&self, description: &str) -> StudioResult<GenerationResponse> {
        self.generate(text_to_image_request(description))
    }

    pub fn refine(
        &self,
        prior: &DynamicImage,
        refinement: &str,
    ) -> StudioResult<GenerationResponse> {
        self.generate(refine_request(prior, refinement))
    }

    pub fn remove_background(&self, source: &DynamicImage) -> StudioResult<GenerationResponse> {
        self.generate(background_removal_request(source))
    }

    pub fn recommend(&self, styling_context: &str) -> StudioResult<GenerationResponse> {
        self.generate(recommendation_request(styling_context))
    }

    /// Single outbound call. Transport failures are wrapped with the
    /// operation name and never retried here.
    pub fn generate(&self, request: GenerationRequest) -> StudioResult<GenerationResponse> {
        let operation = request.operation;
        let model = if operation.uses_text_model() {
            self.text_model.as_str()
        } else {
            self.image_model.as_str()
        };
        tracing::info!(
            operation = operation.as_str(),
            model,
            images = request.image_count(),
            parts = request.inputs.len(),
            "sending generation request"
        );
        let response = self
            .transport
            .generate(model, &request)
            .map_err(|source| StudioError::Generation { operation, source })?;
        tracing::debug!(
            operation = operation.as_str(),
            candidates = response.candidates.len(),
            "generation response received"
        );
        Ok(response)
    }
}

fn image_hints(
    modalities: Vec<ResponseModality>,
    aspect_ratio: Option<&str>,
    image_size: &str,
) -> ModalityHints {
    ModalityHints {
        response_modalities: modalities,
        temperature: Some(0.0),
        aspect_ratio: aspect_ratio.map(str::to_string),
        image_size: Some(image_size.to_string()),
        thinking: None,
    }
}

/// Clothing images first, then the person, then the instruction.
pub fn try_on_request(
    person: &DynamicImage,
    clothing: &[DynamicImage],
    instruction: &str,
) -> GenerationRequest {
    let mut inputs = clothing
        .iter()
        .cloned()
        .map(ContentPart::Image)
        .collect::<Vec<_>>();
    inputs.push(ContentPart::Image(person.clone()));
    inputs.push(ContentPart::Text(instruction.to_string()));
    GenerationRequest {
        operation: GenerationOperation::TryOn,
        inputs,
        hints: image_hints(
            vec![ResponseModality::Image, ResponseModality::Text],
            Some(TRY_ON_ASPECT_RATIO),
            TRY_ON_IMAGE_SIZE,
        ),
    }
}

pub fn text_to_image_request(description: &str) -> GenerationRequest {
    GenerationRequest {
        operation: GenerationOperation::TextToImage,
        inputs: vec![ContentPart::Text(clothing_item_prompt(description))],
        hints: image_hints(
            vec![ResponseModality::Image, ResponseModality::Text],
            Some(CLOTHING_ASPECT_RATIO),
            CLOTHING_IMAGE_SIZE,
        ),
    }
}

pub fn refine_request(prior: &DynamicImage, refinement: &str) -> GenerationRequest {
    GenerationRequest {
        operation: GenerationOperation::Refine,
        inputs: vec![
            ContentPart::Text(refine_prompt(refinement)),
            ContentPart::Image(prior.clone()),
        ],
        hints: image_hints(
            vec![ResponseModality::Image, ResponseModality::Text],
            None,
            REFINE_IMAGE_SIZE,
        ),
    }
}

pub fn background_removal_request(source: &DynamicImage) -> GenerationRequest {
    GenerationRequest {
        operation: GenerationOperation::BackgroundRemoval,
        inputs: vec![
            ContentPart::Text(BACKGROUND_REMOVAL_INSTRUCTION.to_string()),
            ContentPart::Image(source.clone()),
        ],
        hints: image_hints(
            vec![ResponseModality::Image],
            Some(CLOTHING_ASPECT_RATIO),
            CLOTHING_IMAGE_SIZE,
        ),
    }
}

pub fn recommendation_request(styling_context: &str) -> GenerationRequest {
    GenerationRequest {
        operation: GenerationOperation::Recommendation,
        inputs: vec![ContentPart::Text(styling_context.to_string())],
        hints: ModalityHints {
            thinking: Some(ThinkingHints {
                include_thoughts: true,
                level: RECOMMENDATION_THINKING_LEVEL.to_string(),
            }),
            ..ModalityHints::default()
        },
    }
}

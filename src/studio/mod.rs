//! Request-scoped orchestration over the generation client.
//!
//! Every flow is synchronous: remote calls happen one after another and each
//! stage consumes the previous stage's image. A [`TryOnStudio`] holds no
//! mutable state, so one instance can serve concurrent requests.

pub mod background;
pub mod catalog;
pub mod recommend;
pub mod tryon;

use std::sync::Arc;

use image::DynamicImage;

use crate::error::{StudioError, StudioResult};
use crate::generation::{GeminiTransport, GenerationClient};
use crate::imaging::{resize_if_needed, BorderKeyMatte, SharedLocalMatte};
use crate::settings::{StudioSettings, DEFAULT_MAX_INPUT_DIMENSION};

pub use background::{BackgroundRemovalOutcome, RemovalStage, RemoteStripOutcome};
pub use recommend::parse_recommendations;
pub use tryon::{TryOnOutcome, TryOnSource};

#[derive(Clone)]
pub struct TryOnStudio {
    client: GenerationClient,
    matte: SharedLocalMatte,
    max_input_dimension: Option<u32>,
}

impl TryOnStudio {
    pub fn new(client: GenerationClient, matte: SharedLocalMatte) -> Self {
        Self {
            client,
            matte,
            max_input_dimension: Some(DEFAULT_MAX_INPUT_DIMENSION),
        }
    }

    pub fn with_max_input_dimension(mut self, max_input_dimension: Option<u32>) -> Self {
        self.max_input_dimension = max_input_dimension.filter(|v| *v > 0);
        self
    }

    /// Gemini transport plus the border-key matte, both configured from settings.
    pub fn from_settings(settings: &StudioSettings) -> StudioResult<Self> {
        let api_key = settings.require_api_key()?;
        let transport = GeminiTransport::new(
            api_key,
            settings.api_base_url.as_str(),
            settings.request_timeout(),
        )
        .map_err(StudioError::TransportInit)?;
        let client = GenerationClient::new(
            Arc::new(transport),
            settings.image_model.as_str(),
            settings.text_model.as_str(),
        );
        Ok(
            Self::new(client, Arc::new(BorderKeyMatte::new(settings.matte)))
                .with_max_input_dimension(settings.max_input_dimension),
        )
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    pub fn max_input_dimension(&self) -> Option<u32> {
        self.max_input_dimension
    }

    fn cap_input(&self, image: DynamicImage) -> DynamicImage {
        match self.max_input_dimension {
            Some(max) => resize_if_needed(image, max),
            None => image,
        }
    }
}

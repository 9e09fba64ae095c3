#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgb, RgbImage};
use tryon_studio_core::generation::{
    GenerationClient, GenerationRequest, GenerationResponse, GenerationTransport, ResponsePart,
    TransportError,
};
use tryon_studio_core::imaging::{encode_png, BorderKeyMatte, MatteSettings};
use tryon_studio_core::studio::TryOnStudio;

pub const IMAGE_MODEL: &str = "test-image-model";
pub const TEXT_MODEL: &str = "test-text-model";

/// Replays queued responses in order and records every request it sees.
/// An exhausted queue answers with an empty response.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    seen: Arc<Mutex<Vec<(String, GenerationRequest)>>>,
    next: Arc<Mutex<VecDeque<Result<GenerationResponse, TransportError>>>>,
}

impl ScriptedTransport {
    pub fn with_responses(
        responses: Vec<Result<GenerationResponse, TransportError>>,
    ) -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
            next: Arc::new(Mutex::new(responses.into_iter().collect())),
        }
    }

    pub fn take_seen(&self) -> Vec<(String, GenerationRequest)> {
        std::mem::take(&mut *self.seen.lock().expect("scripted transport mutex poisoned"))
    }
}

impl GenerationTransport for ScriptedTransport {
    fn generate(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, TransportError> {
        self.seen
            .lock()
            .expect("scripted transport mutex poisoned")
            .push((model.to_string(), request.clone()));
        self.next
            .lock()
            .expect("scripted transport mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(GenerationResponse::default()))
    }
}

pub fn studio_with(transport: &ScriptedTransport) -> TryOnStudio {
    let client = GenerationClient::new(Arc::new(transport.clone()), IMAGE_MODEL, TEXT_MODEL);
    TryOnStudio::new(
        client,
        Arc::new(BorderKeyMatte::new(MatteSettings::default())),
    )
}

pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
}

/// White canvas with a centred coloured block, the usual shape of a
/// product shot.
pub fn product_shot(size: u32, block: u32, color: [u8; 3]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(size, size, Rgb([255, 255, 255]));
    let start = (size - block) / 2;
    for y in start..start + block {
        for x in start..start + block {
            img.put_pixel(x, y, Rgb(color));
        }
    }
    DynamicImage::ImageRgb8(img)
}

pub fn png_part(image: &DynamicImage) -> ResponsePart {
    ResponsePart::InlineImage {
        mime_type: String::from("image/png"),
        data: encode_png(image).expect("png should encode"),
    }
}

pub fn text_part(text: &str) -> ResponsePart {
    ResponsePart::Text(text.to_string())
}

pub fn response(parts: Vec<ResponsePart>) -> Result<GenerationResponse, TransportError> {
    Ok(GenerationResponse::from_parts(parts))
}

pub fn unavailable() -> Result<GenerationResponse, TransportError> {
    Err(TransportError::Status {
        status: 503,
        body: String::from("model overloaded"),
    })
}

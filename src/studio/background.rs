use image::{DynamicImage, RgbaImage};

use super::TryOnStudio;
use crate::error::StudioResult;
use crate::generation::{extract_image, GenerationOperation};
use crate::imaging::normalize_rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStage {
    RemoteStrip,
    LocalMatte,
}

impl RemovalStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemoteStrip => "remote_strip",
            Self::LocalMatte => "local_matte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStripOutcome {
    Stripped,
    Absent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundRemovalOutcome {
    pub image: RgbaImage,
    pub remote: RemoteStripOutcome,
}

impl BackgroundRemovalOutcome {
    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageRgba8(self.image)
    }
}

impl TryOnStudio {
    /// Remote strip followed by a local matte. The local matte always runs,
    /// also on a successful remote result, and is the only fatal stage.
    pub fn remove_background(&self, source: DynamicImage) -> StudioResult<BackgroundRemovalOutcome> {
        let source = normalize_rgb(source);
        tracing::info!(
            stage = RemovalStage::RemoteStrip.as_str(),
            width = source.width(),
            height = source.height(),
            "requesting background removal"
        );
        let (matte_input, remote) = match self.remote_strip(&source) {
            Ok(Some(stripped)) => (stripped, RemoteStripOutcome::Stripped),
            Ok(None) => {
                tracing::warn!(
                    stage = RemovalStage::RemoteStrip.as_str(),
                    "remote strip returned no image, matting source locally"
                );
                (source, RemoteStripOutcome::Absent)
            }
            Err(err) => {
                tracing::warn!(
                    stage = RemovalStage::RemoteStrip.as_str(),
                    error = %err,
                    "remote strip failed, matting source locally"
                );
                (source, RemoteStripOutcome::Failed(err.to_string()))
            }
        };

        tracing::info!(
            stage = RemovalStage::LocalMatte.as_str(),
            "applying local transparency matte"
        );
        let image = self.matte.matte(&matte_input)?;
        Ok(BackgroundRemovalOutcome { image, remote })
    }

    fn remote_strip(&self, source: &DynamicImage) -> StudioResult<Option<DynamicImage>> {
        let response = self.client.remove_background(source)?;
        Ok(extract_image(GenerationOperation::BackgroundRemoval, &response)?.image)
    }
}

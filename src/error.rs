use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::generation::{GenerationOperation, TransportError};
use crate::imaging::matting::MattingError;
use crate::settings::SettingsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Provider,
    Infra,
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{operation} generation failed: {source}")]
    Generation {
        operation: GenerationOperation,
        #[source]
        source: TransportError,
    },
    #[error("{operation} generation returned no usable content")]
    EmptyGenerationResult { operation: GenerationOperation },
    #[error("unable to parse recommendations response as JSON: {source}")]
    Parse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{operation} returned an image that could not be decoded: {source}")]
    ImageDecode {
        operation: GenerationOperation,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load image '{}': {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("generation transport could not be initialised: {0}")]
    TransportInit(#[source] TransportError),
    #[error("local matting failed: {0}")]
    Matting(#[from] MattingError),
    #[error("{0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl StudioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) | Self::ImageLoad { .. } => ErrorKind::Validation,
            Self::Generation { .. }
            | Self::EmptyGenerationResult { .. }
            | Self::Parse { .. }
            | Self::ImageDecode { .. } => ErrorKind::Provider,
            Self::TransportInit(_) | Self::Matting(_) | Self::Settings(_) => ErrorKind::Infra,
        }
    }

    /// Operation the failure belongs to, when it came from a remote call.
    pub fn operation(&self) -> Option<GenerationOperation> {
        match self {
            Self::Generation { operation, .. }
            | Self::EmptyGenerationResult { operation }
            | Self::ImageDecode { operation, .. } => Some(*operation),
            Self::Parse { .. } => Some(GenerationOperation::Recommendation),
            _ => None,
        }
    }
}

pub type StudioResult<T> = Result<T, StudioError>;

pub mod error;
pub mod generation;
pub mod imaging;
pub mod settings;
pub mod studio;

pub use error::{ErrorKind, StudioError, StudioResult};
pub use generation::{
    GenerationClient, GenerationOperation, GenerationRequest, GenerationResponse,
    GenerationTransport,
};
pub use settings::{load_studio_settings, StudioSettings, StudioSettingsOverlay};
pub use studio::TryOnStudio;

pub mod matting;
pub mod preprocess;
pub mod preview;

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::{StudioError, StudioResult};

pub use matting::{BorderKeyMatte, LocalMatte, MatteSettings, SharedLocalMatte};
pub use preprocess::{normalize_rgb, resize_if_needed};
pub use preview::{compose_preview, PREVIEW_HEIGHT};

pub fn load_image_path(path: &Path) -> StudioResult<DynamicImage> {
    image::open(path).map_err(|source| StudioError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn save_png(image: &DynamicImage, path: &Path) -> Result<(), image::ImageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
    }
    image.save_with_format(path, ImageFormat::Png)
}

use std::collections::VecDeque;
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MattingError {
    #[error("cannot matte an empty image ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

/// Local foreground extraction. Always produces an image with an alpha channel.
pub trait LocalMatte: Send + Sync + 'static {
    fn matte(&self, image: &DynamicImage) -> Result<RgbaImage, MattingError>;
}

pub type SharedLocalMatte = Arc<dyn LocalMatte>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatteSettings {
    /// Max per-channel distance from the background key that still counts as background.
    pub tolerance: u8,
    /// Width of the soft edge band below `tolerance`.
    pub feather: u8,
}

impl Default for MatteSettings {
    fn default() -> Self {
        Self {
            tolerance: 48,
            feather: 16,
        }
    }
}

/// Keys out the background colour seen on the image border.
///
/// The key is the per-channel median of all border pixels. Background is
/// everything 4-connected to the border whose colour stays within
/// `tolerance` of the key, so enclosed regions of the same colour (a white
/// logo on a shirt) keep full opacity. Pixels in the feather band get a
/// linear alpha ramp. Any alpha already present in the input is kept when
/// it is lower.
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderKeyMatte {
    settings: MatteSettings,
}

impl BorderKeyMatte {
    pub fn new(settings: MatteSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> MatteSettings {
        self.settings
    }

    fn alpha_for_distance(&self, distance: u8) -> u8 {
        let tolerance = self.settings.tolerance;
        let inner = tolerance.saturating_sub(self.settings.feather);
        if distance <= inner {
            return 0;
        }
        let band = u32::from(tolerance - inner).max(1);
        let alpha = u32::from(distance - inner) * 255 / band;
        alpha.min(255) as u8
    }
}

impl LocalMatte for BorderKeyMatte {
    fn matte(&self, image: &DynamicImage) -> Result<RgbaImage, MattingError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(MattingError::EmptyImage { width, height });
        }
        let rgb = image.to_rgb8();
        let source_alpha = image.color().has_alpha().then(|| image.to_rgba8());
        let key = border_key(&rgb);
        let background = flood_background(&rgb, key, self.settings.tolerance);

        let mut out = RgbaImage::new(width, height);
        let mut cleared = 0usize;
        for (x, y, px) in rgb.enumerate_pixels() {
            let idx = (y as usize) * (width as usize) + x as usize;
            let mut alpha = if background[idx] {
                self.alpha_for_distance(distance(px, &key))
            } else {
                255
            };
            if let Some(src) = source_alpha.as_ref() {
                alpha = alpha.min(src.get_pixel(x, y)[3]);
            }
            if alpha == 0 {
                cleared += 1;
            }
            out.put_pixel(x, y, Rgba([px[0], px[1], px[2], alpha]));
        }
        tracing::debug!(
            width,
            height,
            key_r = key[0],
            key_g = key[1],
            key_b = key[2],
            cleared,
            "local matte applied"
        );
        Ok(out)
    }
}

fn border_key(rgb: &RgbImage) -> Rgb<u8> {
    let (width, height) = rgb.dimensions();
    let mut channels: [Vec<u8>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut push = |px: &Rgb<u8>| {
        for (c, values) in channels.iter_mut().enumerate() {
            values.push(px[c]);
        }
    };
    for x in 0..width {
        push(rgb.get_pixel(x, 0));
        if height > 1 {
            push(rgb.get_pixel(x, height - 1));
        }
    }
    for y in 1..height.saturating_sub(1) {
        push(rgb.get_pixel(0, y));
        if width > 1 {
            push(rgb.get_pixel(width - 1, y));
        }
    }
    let mut key = [0u8; 3];
    for (c, values) in channels.iter_mut().enumerate() {
        values.sort_unstable();
        key[c] = values[values.len() / 2];
    }
    Rgb(key)
}

fn distance(px: &Rgb<u8>, key: &Rgb<u8>) -> u8 {
    (0..3)
        .map(|c| px[c].abs_diff(key[c]))
        .max()
        .unwrap_or(0)
}

fn flood_background(rgb: &RgbImage, key: Rgb<u8>, tolerance: u8) -> Vec<bool> {
    let (width, height) = rgb.dimensions();
    let w = width as usize;
    let mut visited = vec![false; w * height as usize];
    let mut queue = VecDeque::new();

    let seed = |x: u32, y: u32, visited: &mut [bool], queue: &mut VecDeque<(u32, u32)>| {
        let idx = (y as usize) * w + x as usize;
        if !visited[idx] && distance(rgb.get_pixel(x, y), &key) <= tolerance {
            visited[idx] = true;
            queue.push_back((x, y));
        }
    };

    for x in 0..width {
        seed(x, 0, &mut visited, &mut queue);
        seed(x, height - 1, &mut visited, &mut queue);
    }
    for y in 0..height {
        seed(0, y, &mut visited, &mut queue);
        seed(width - 1, y, &mut visited, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        if x > 0 {
            seed(x - 1, y, &mut visited, &mut queue);
        }
        if x + 1 < width {
            seed(x + 1, y, &mut visited, &mut queue);
        }
        if y > 0 {
            seed(x, y - 1, &mut visited, &mut queue);
        }
        if y + 1 < height {
            seed(x, y + 1, &mut visited, &mut queue);
        }
    }
    visited
}

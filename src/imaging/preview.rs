use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

pub const PREVIEW_HEIGHT: u32 = 600;

/// Side-by-side fallback used when try-on generation yields no image:
/// both inputs at a common height on a white canvas, primary on the left.
pub fn compose_preview(primary: &DynamicImage, secondary: &DynamicImage) -> DynamicImage {
    let left = rescale_to_height(primary, PREVIEW_HEIGHT);
    let right = rescale_to_height(secondary, PREVIEW_HEIGHT);
    let total_width = left.width() + right.width();

    let mut canvas = RgbImage::from_pixel(total_width, PREVIEW_HEIGHT, Rgb([255, 255, 255]));
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, i64::from(left.width()), 0);
    tracing::debug!(width = total_width, height = PREVIEW_HEIGHT, "composed preview image");
    DynamicImage::ImageRgb8(canvas)
}

pub(crate) fn preview_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    ((u64::from(width) * u64::from(target_height)) / u64::from(height)).max(1) as u32
}

fn rescale_to_height(image: &DynamicImage, target_height: u32) -> RgbImage {
    let width = preview_width(image.width(), image.height(), target_height);
    image
        .resize_exact(width, target_height, FilterType::Lanczos3)
        .to_rgb8()
}

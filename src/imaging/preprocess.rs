use image::imageops::FilterType;
use image::DynamicImage;

/// Caps the longer side at `max_dimension`, keeping the aspect ratio.
/// Images already within bound are returned untouched.
pub fn resize_if_needed(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let longer = width.max(height);
    if max_dimension == 0 || longer <= max_dimension {
        return image;
    }
    let ratio = f64::from(max_dimension) / f64::from(longer);
    let new_width = scale_side(width, ratio, max_dimension);
    let new_height = scale_side(height, ratio, max_dimension);
    tracing::debug!(
        from_width = width,
        from_height = height,
        to_width = new_width,
        to_height = new_height,
        "resizing image"
    );
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

fn scale_side(side: u32, ratio: f64, max_dimension: u32) -> u32 {
    ((f64::from(side) * ratio).round() as u32).clamp(1, max_dimension)
}

pub fn normalize_rgb(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

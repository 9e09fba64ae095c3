pub const DEFAULT_TRY_ON_INSTRUCTION: &str = "try on clothes";

pub const BACKGROUND_REMOVAL_INSTRUCTION: &str =
    "remove background and any human part and put it on a white transparent background";

pub const TRY_ON_ASPECT_RATIO: &str = "4:5";
pub const TRY_ON_IMAGE_SIZE: &str = "2K";
pub const CLOTHING_ASPECT_RATIO: &str = "4:5";
pub const CLOTHING_IMAGE_SIZE: &str = "1K";
pub const REFINE_IMAGE_SIZE: &str = "4K";
pub const RECOMMENDATION_THINKING_LEVEL: &str = "LOW";

pub fn clothing_item_prompt(description: &str) -> String {
    format!(
        "A professional, clean, flat-lay product photography of {} on a pure white background. High quality, realistic texture, studio lighting. Ensure the item is isolated.",
        description.trim()
    )
}

pub fn refine_prompt(refinement: &str) -> String {
    format!(
        "Edit this clothing item. {}. Keep the item isolated on a pure white background. High quality, realistic texture.",
        refinement.trim()
    )
}

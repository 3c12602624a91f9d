//! Picks artwork variants for list rows and detail views

use super::content::Image;

/// Width the large thumbnail should be closest to
pub const DESIRED_THUMBNAIL_WIDTH: u32 = 300;

fn width(image: &Image) -> u32 {
    image.width.unwrap_or(0)
}

/// The narrowest variant
pub fn small_thumbnail(images: &[Image]) -> Option<&str> {
    images
        .iter()
        .min_by_key(|image| width(image))
        .map(|image| image.url.as_str())
}

/// The variant whose width is closest to `desired_width`
pub fn large_thumbnail(images: &[Image], desired_width: u32) -> Option<&str> {
    images
        .iter()
        .min_by_key(|image| width(image).abs_diff(desired_width))
        .map(|image| image.url.as_str())
}

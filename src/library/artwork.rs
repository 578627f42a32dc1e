//! Album-art extraction and thumbnailing.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use lofty::file::TaggedFileExt;
use lofty::picture::PictureType;

use super::source::CatalogError;

/// First embedded front cover in any tag of `path`, falling back to the first
/// picture of any type.
pub fn load_embedded_art(path: &Path) -> Result<DynamicImage, CatalogError> {
    let tagged = lofty::read_from_path(path).map_err(|e| CatalogError::Thumbnail(e.to_string()))?;

    let pictures: Vec<_> = tagged.tags().iter().flat_map(|t| t.pictures()).collect();
    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == PictureType::CoverFront)
        .or_else(|| pictures.first())
        .ok_or_else(|| CatalogError::Thumbnail(format!("no embedded picture in {}", path.display())))?;

    image::load_from_memory(picture.data()).map_err(|e| CatalogError::Thumbnail(e.to_string()))
}

pub fn load_image_file(path: &Path) -> Result<DynamicImage, CatalogError> {
    image::open(path).map_err(|e| CatalogError::Thumbnail(e.to_string()))
}

/// Scale `img` to fit inside a `size`×`size` box, keeping the aspect ratio.
pub fn square_thumbnail(img: &DynamicImage, size: u32) -> RgbaImage {
    img.thumbnail(size, size).to_rgba8()
}

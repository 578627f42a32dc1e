//! The read-only contract between the catalog and a media index.

use std::path::PathBuf;

use image::RgbaImage;
use thiserror::Error;

use super::model::CatalogEntry;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Audio,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    TitleAscending,
}

/// Filter and ordering requested from the index.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub kind: MediaKind,
    pub sort: SortOrder,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("library root {0} does not exist or is not a directory")]
    RootMissing(PathBuf),
    #[error("walking library: {0}")]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no artwork for album {0}")]
    NoArtwork(u64),
    #[error("thumbnail: {0}")]
    Thumbnail(String),
}

/// A queryable index of audio entries.
///
/// `query` returns rows already filtered by `kind` and ordered by `sort`.
/// `load_thumbnail` may fail for any reason; callers treat failure as
/// "no artwork".
pub trait CatalogSource: Send + Sync {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError>;

    fn load_thumbnail(&self, album_id: u64, size: u32) -> Result<RgbaImage, CatalogError>;
}

//! Audio catalog: scanning a media index into ordered [`Track`] records.
//!
//! A [`CatalogSource`] answers row queries (the filesystem implementation is
//! [`FsCatalog`]); the [`Catalog`] turns rows into normalized tracks and
//! caches the result of the last full scan.

mod artwork;
mod catalog;
mod display;
mod model;
mod scan;
mod source;

pub use artwork::{load_embedded_art, load_image_file, square_thumbnail};
pub use catalog::{Catalog, ScanOutcome};
pub use display::format_duration;
pub use model::*;
pub use scan::FsCatalog;
pub use source::{CatalogError, CatalogQuery, CatalogSource, MediaKind, SortOrder};

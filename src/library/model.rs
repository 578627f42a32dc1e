use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// Stable numeric identity of a catalog entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One raw row as returned by a [`CatalogSource`](super::CatalogSource).
///
/// Text columns are kept exactly as the index reported them; normalization
/// happens in [`Track::from_entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: u64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_ms: u64,
    /// File locator. Rows with a blank locator are dropped during a scan.
    pub data: String,
    pub size_bytes: u64,
    pub album_id: u64,
    pub album_art_path: Option<PathBuf>,
}

/// An immutable, normalized track record.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u64,
    pub locator: String,
    pub size_bytes: u64,
    pub thumbnail: Option<Arc<RgbaImage>>,
    pub thumbnail_path: Option<PathBuf>,
}

impl Track {
    /// Build a track from a catalog row. Returns `None` when the row has no
    /// usable file locator.
    pub fn from_entry(entry: CatalogEntry, thumbnail: Option<Arc<RgbaImage>>) -> Option<Self> {
        if entry.data.trim().is_empty() {
            return None;
        }

        Some(Self {
            id: TrackId(entry.id),
            title: normalize_title(entry.title.as_deref()),
            artist: normalize_artist(entry.artist.as_deref()),
            album: normalize_album(entry.album.as_deref()),
            duration_ms: entry.duration_ms,
            locator: entry.data,
            size_bytes: entry.size_bytes,
            thumbnail,
            thumbnail_path: entry.album_art_path,
        })
    }
}

fn or_placeholder(raw: Option<&str>, placeholder: &str) -> String {
    match raw {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

pub fn normalize_title(raw: Option<&str>) -> String {
    or_placeholder(raw, UNKNOWN_TITLE)
}

pub fn normalize_artist(raw: Option<&str>) -> String {
    or_placeholder(raw, UNKNOWN_ARTIST)
}

pub fn normalize_album(raw: Option<&str>) -> String {
    or_placeholder(raw, UNKNOWN_ALBUM)
}

/// 64-bit FNV-1a. Used for ids that must stay stable across runs.
pub fn stable_id(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

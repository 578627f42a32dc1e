use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::RgbaImage;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::tag::Accessor;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::artwork::{load_embedded_art, load_image_file, square_thumbnail};
use super::model::{CatalogEntry, stable_id};
use super::source::{CatalogError, CatalogQuery, CatalogSource, SortOrder};

/// Where artwork for one album can be found.
#[derive(Debug, Default, Clone)]
struct AlbumArt {
    tracks: Vec<PathBuf>,
    sidecar: Option<PathBuf>,
}

/// A [`CatalogSource`] backed by a directory tree.
///
/// Tags are read with lofty; files without a title tag get their file stem
/// as title, the same way a platform media index fills that column.
#[derive(Debug)]
pub struct FsCatalog {
    root: PathBuf,
    settings: LibrarySettings,
    albums: Mutex<HashMap<u64, AlbumArt>>,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
            albums: Mutex::new(HashMap::new()),
        }
    }

    fn read_entry(&self, path: &Path) -> CatalogEntry {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string);

        let mut title = stem;
        let mut artist: Option<String> = None;
        let mut album: Option<String> = None;
        let mut duration_ms = 0;

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                duration_ms = u64::try_from(tagged.properties().duration().as_millis())
                    .unwrap_or(u64::MAX);

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(v) = tag.title() {
                        if !v.trim().is_empty() {
                            title = Some(v.to_string());
                        }
                    }
                    artist = tag.artist().map(|v| v.trim().to_string());
                    album = tag.album().map(|v| v.trim().to_string());
                }
            }
            Err(e) => debug!(path = %path.display(), error = %e, "unreadable tags"),
        }

        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let album_id = album_id_for(path, artist.as_deref(), album.as_deref());

        CatalogEntry {
            id: stable_id(path.as_os_str().as_encoded_bytes()),
            title,
            artist,
            album,
            duration_ms,
            data: path.to_string_lossy().into_owned(),
            size_bytes,
            album_id,
            album_art_path: self.sidecar_art(path),
        }
    }

    fn sidecar_art(&self, track: &Path) -> Option<PathBuf> {
        let dir = track.parent()?;
        self.settings
            .sidecar_art_names
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }
}

/// Albums are keyed by `artist\x1falbum`; untagged files share an album with
/// the other files of their directory.
fn album_id_for(path: &Path, artist: Option<&str>, album: Option<&str>) -> u64 {
    match album.filter(|a| !a.is_empty()) {
        Some(album) => {
            let key = format!("{}\u{1f}{}", artist.unwrap_or_default(), album).to_lowercase();
            stable_id(key.as_bytes())
        }
        None => {
            let dir = path.parent().unwrap_or(path);
            stable_id(dir.as_os_str().as_encoded_bytes())
        }
    }
}

pub(super) fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl CatalogSource for FsCatalog {
    fn query(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
        if !self.root.is_dir() {
            return Err(CatalogError::RootMissing(self.root.clone()));
        }

        let settings = &self.settings;
        let mut walker = WalkDir::new(&self.root).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        let mut entries = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable library entry");
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && is_audio_file(path, settings) {
                entries.push(self.read_entry(path));
            }
        }

        match query.sort {
            SortOrder::TitleAscending => entries.sort_by(|a, b| {
                let ta = a.title.as_deref().unwrap_or_default().to_lowercase();
                let tb = b.title.as_deref().unwrap_or_default().to_lowercase();
                ta.cmp(&tb).then_with(|| a.data.cmp(&b.data))
            }),
        }

        let mut albums = HashMap::<u64, AlbumArt>::new();
        for e in &entries {
            let art = albums.entry(e.album_id).or_default();
            art.tracks.push(PathBuf::from(&e.data));
            if art.sidecar.is_none() {
                art.sidecar = e.album_art_path.clone();
            }
        }
        if let Ok(mut guard) = self.albums.lock() {
            *guard = albums;
        }

        Ok(entries)
    }

    fn load_thumbnail(&self, album_id: u64, size: u32) -> Result<RgbaImage, CatalogError> {
        let art = self
            .albums
            .lock()
            .ok()
            .and_then(|albums| albums.get(&album_id).cloned())
            .ok_or(CatalogError::NoArtwork(album_id))?;

        if let Some(img) = art.tracks.iter().find_map(|p| load_embedded_art(p).ok()) {
            return Ok(square_thumbnail(&img, size));
        }

        let sidecar = art.sidecar.ok_or(CatalogError::NoArtwork(album_id))?;
        let img = load_image_file(&sidecar)?;
        Ok(square_thumbnail(&img, size))
    }
}

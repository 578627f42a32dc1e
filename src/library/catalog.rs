use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, RwLock};
use std::thread;

use image::RgbaImage;
use tracing::{debug, info, warn};

use super::model::{Track, TrackId};
use super::source::{CatalogError, CatalogQuery, CatalogSource};

/// Result of a background scan, delivered once on completion.
pub type ScanOutcome = Result<Arc<[Track]>, CatalogError>;

/// The audio catalog index.
///
/// Every scan is a full rescan; the cached collection is swapped in one step
/// when the scan completes, so readers never see a partial result.
pub struct Catalog {
    source: Box<dyn CatalogSource>,
    thumbnail_size: u32,
    tracks: RwLock<Arc<[Track]>>,
}

impl Catalog {
    pub fn new(source: impl CatalogSource + 'static, thumbnail_size: u32) -> Self {
        Self {
            source: Box::new(source),
            thumbnail_size,
            tracks: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Scan the index, reporting failure explicitly.
    pub fn try_scan(&self) -> ScanOutcome {
        let rows = self.source.query(&CatalogQuery::default())?;
        let row_count = rows.len();

        let mut thumbnails: HashMap<u64, Option<Arc<RgbaImage>>> = HashMap::new();
        let mut tracks = Vec::with_capacity(row_count);

        for row in rows {
            if row.data.trim().is_empty() {
                continue;
            }
            let thumbnail = thumbnails
                .entry(row.album_id)
                .or_insert_with(|| self.thumbnail(row.album_id))
                .clone();
            tracks.extend(Track::from_entry(row, thumbnail));
        }

        let tracks: Arc<[Track]> = Arc::from(tracks);
        if let Ok(mut cached) = self.tracks.write() {
            *cached = tracks.clone();
        }

        info!(
            rows = row_count,
            tracks = tracks.len(),
            albums = thumbnails.len(),
            "catalog scan complete"
        );
        Ok(tracks)
    }

    /// Scan the index; any failure yields an empty collection.
    pub fn scan(&self) -> Arc<[Track]> {
        match self.try_scan() {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(error = %e, "catalog scan failed, treating as empty");
                let empty: Arc<[Track]> = Arc::from(Vec::new());
                if let Ok(mut cached) = self.tracks.write() {
                    *cached = empty.clone();
                }
                empty
            }
        }
    }

    /// Run [`Catalog::try_scan`] on a worker thread. The receiver yields exactly
    /// one outcome.
    pub fn scan_in_background(self: &Arc<Self>) -> Receiver<ScanOutcome> {
        let (tx, rx) = mpsc::channel();
        let catalog = Arc::clone(self);
        thread::spawn(move || {
            let _ = tx.send(catalog.try_scan());
        });
        rx
    }

    /// Tracks from the last completed scan.
    pub fn tracks(&self) -> Arc<[Track]> {
        self.tracks
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|_| Arc::from(Vec::new()))
    }

    pub fn get_by_id(&self, id: TrackId) -> Option<Track> {
        self.tracks().iter().find(|t| t.id == id).cloned()
    }

    fn thumbnail(&self, album_id: u64) -> Option<Arc<RgbaImage>> {
        match self.source.load_thumbnail(album_id, self.thumbnail_size) {
            Ok(img) => Some(Arc::new(img)),
            Err(e) => {
                debug!(album_id, error = %e, "no thumbnail");
                None
            }
        }
    }
}

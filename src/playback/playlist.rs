use crate::library::{Track, TrackId};

/// Ordered tracks plus the current index.
///
/// The index is `Some` and in bounds whenever the playlist is non-empty, and
/// `None` when it is empty.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: Option<usize>,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>, start_index: usize) -> Self {
        let current = Self::clamp_index(start_index, tracks.len());
        Self { tracks, current }
    }

    /// `max(0, min(index, len - 1))`, or `None` for an empty list.
    pub fn clamp_index(index: usize, len: usize) -> Option<usize> {
        len.checked_sub(1).map(|last| index.min(last))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Move to `index` if it is in bounds.
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index >= self.tracks.len() {
            return None;
        }
        self.current = Some(index);
        self.tracks.get(index)
    }

    pub fn has_next(&self) -> bool {
        self.current.is_some_and(|i| i + 1 < self.tracks.len())
    }

    pub fn has_previous(&self) -> bool {
        self.current.is_some_and(|i| i > 0)
    }
}

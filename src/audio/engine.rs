use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;

use crate::library::{Track, TrackId};

/// One entry loaded into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: TrackId,
    pub locator: String,
}

impl From<&Track> for MediaItem {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            locator: track.locator.clone(),
        }
    }
}

/// Why the engine's position jumped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DiscontinuityReason {
    /// The previous item finished and the engine moved on by itself.
    AutoTransition,
    /// An explicit seek (by position or by item) completed.
    Seek,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    IsPlayingChanged(bool),
    PositionDiscontinuity {
        position_ms: u64,
        item_index: Option<usize>,
        reason: DiscontinuityReason,
    },
    MediaItemTransition {
        item_index: Option<usize>,
    },
}

/// Outbound event channel handed to an engine at construction.
#[derive(Clone)]
pub struct EngineEvents {
    emit: Arc<dyn Fn(EngineEvent) + Send + Sync>,
}

impl EngineEvents {
    pub fn new(emit: impl Fn(EngineEvent) + Send + Sync + 'static) -> Self {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// Forward events into any channel whose message type wraps them.
    pub fn from_sender<T>(tx: Sender<T>) -> Self
    where
        T: From<EngineEvent> + Send + 'static,
    {
        Self::new(move |ev| {
            let _ = tx.send(T::from(ev));
        })
    }

    /// Events that go nowhere.
    pub fn discard() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, ev: EngineEvent) {
        (self.emit)(ev);
    }
}

impl fmt::Debug for EngineEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineEvents").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("no media item at index {0}")]
    NoSuchItem(usize),
}

/// An external player that owns decoding and output.
///
/// Commands return once the engine accepted them; their effects are reported
/// asynchronously through [`EngineEvents`].
pub trait MediaEngine {
    /// Replace all loaded items. Playback stops; no item is prepared yet.
    fn set_items(&mut self, items: Vec<MediaItem>);

    fn clear(&mut self);

    fn seek_to_item(&mut self, index: usize, position_ms: u64) -> Result<(), EngineError>;

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError>;

    fn prepare(&mut self) -> Result<(), EngineError>;

    fn play(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self);

    /// Move to the nearest later item that loads, skipping undecodable ones.
    /// Does not wrap. On failure the current item is kept.
    fn next_item(&mut self) -> Result<(), EngineError>;

    /// Like [`MediaEngine::next_item`], towards the start of the list.
    fn previous_item(&mut self) -> Result<(), EngineError>;

    fn current_item_index(&self) -> Option<usize>;

    fn position_ms(&self) -> u64;

    /// Give polled engines a chance to notice end-of-item.
    fn poll(&mut self) {}

    fn shutdown(&mut self, _fade_out: Duration) {}
}

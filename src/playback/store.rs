//! The observable playback state.
//!
//! [`channel`] creates the single [`StoreWriter`] and a cloneable
//! [`PlaybackView`]. Every write that changes a value is broadcast as a
//! [`StateChange`] to all live subscribers, in write order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::library::Track;

/// Coarse transport state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlayerStatus {
    /// No playlist loaded.
    #[default]
    Idle,
    /// A playlist is loaded and positioned, nothing started yet.
    Loaded,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub user_seeking: bool,
    pub seek_target_ms: Option<u64>,
    pub status: PlayerStatus,
}

/// One notification per observable channel.
#[derive(Debug, Clone)]
pub enum StateChange {
    CurrentTrack(Option<Track>),
    IsPlaying(bool),
    Position(u64),
    UserSeek { active: bool, target_ms: Option<u64> },
    Status(PlayerStatus),
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PlaybackState>,
    subscribers: Mutex<Vec<Sender<StateChange>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Same id and same published metadata. Thumbnails count as equal when both
/// point at the same decoded image.
fn same_track(a: &Track, b: &Track) -> bool {
    a.id == b.id
        && a.title == b.title
        && a.artist == b.artist
        && a.album == b.album
        && a.duration_ms == b.duration_ms
        && a.locator == b.locator
        && a.thumbnail_path == b.thumbnail_path
        && match (&a.thumbnail, &b.thumbnail) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            (None, None) => true,
            _ => false,
        }
}

/// Create a store. The writer goes to the controller; views go everywhere else.
pub fn channel() -> (StoreWriter, PlaybackView) {
    let shared = Arc::new(Shared::default());
    (
        StoreWriter {
            shared: shared.clone(),
        },
        PlaybackView { shared },
    )
}

/// Exclusive write access to the playback state.
#[derive(Debug)]
pub struct StoreWriter {
    shared: Arc<Shared>,
}

impl StoreWriter {
    fn update(&self, apply: impl FnOnce(&mut PlaybackState) -> Option<StateChange>) {
        let change = apply(&mut lock(&self.shared.state));
        if let Some(change) = change {
            lock(&self.shared.subscribers).retain(|tx| tx.send(change.clone()).is_ok());
        }
    }

    pub fn set_current(&self, index: Option<usize>, track: Option<Track>) {
        self.update(|s| {
            let unchanged = match (s.current_track.as_ref(), track.as_ref()) {
                (Some(a), Some(b)) => same_track(a, b),
                (None, None) => true,
                _ => false,
            };
            s.current_index = index;
            s.current_track = track.clone();
            if unchanged {
                return None;
            }
            Some(StateChange::CurrentTrack(track))
        });
    }

    pub fn set_playing(&self, playing: bool) {
        self.update(|s| {
            if s.is_playing == playing {
                return None;
            }
            s.is_playing = playing;
            Some(StateChange::IsPlaying(playing))
        });
    }

    pub fn set_position(&self, position_ms: u64) {
        self.update(|s| {
            if s.position_ms == position_ms {
                return None;
            }
            s.position_ms = position_ms;
            Some(StateChange::Position(position_ms))
        });
    }

    pub fn set_user_seek(&self, active: bool, target_ms: Option<u64>) {
        self.update(|s| {
            if s.user_seeking == active && s.seek_target_ms == target_ms {
                return None;
            }
            s.user_seeking = active;
            s.seek_target_ms = target_ms;
            Some(StateChange::UserSeek { active, target_ms })
        });
    }

    pub fn set_status(&self, status: PlayerStatus) {
        self.update(|s| {
            if s.status == status {
                return None;
            }
            s.status = status;
            Some(StateChange::Status(status))
        });
    }

    pub fn status(&self) -> PlayerStatus {
        lock(&self.shared.state).status
    }
}

/// Read-only access to the playback state.
#[derive(Debug, Clone)]
pub struct PlaybackView {
    shared: Arc<Shared>,
}

impl PlaybackView {
    pub fn snapshot(&self) -> PlaybackState {
        lock(&self.shared.state).clone()
    }

    pub fn current_track(&self) -> Option<Track> {
        lock(&self.shared.state).current_track.clone()
    }

    pub fn current_index(&self) -> Option<usize> {
        lock(&self.shared.state).current_index
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.shared.state).is_playing
    }

    pub fn position_ms(&self) -> u64 {
        lock(&self.shared.state).position_ms
    }

    /// `(active, target_ms)` of a user seek in progress.
    pub fn user_seek(&self) -> (bool, Option<u64>) {
        let s = lock(&self.shared.state);
        (s.user_seeking, s.seek_target_ms)
    }

    pub fn status(&self) -> PlayerStatus {
        lock(&self.shared.state).status
    }

    /// Receive every subsequent change. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<StateChange> {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared.subscribers).push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }
}

use std::time::Duration;

use crate::audio::EngineEvent;
use crate::library::{Track, TrackId};

/// Commands accepted by the playback controller.
#[derive(Debug, Clone)]
pub enum PlayerCmd {
    /// Replace the playlist and select `start_index` (clamped) without playing.
    SetPlaylist {
        tracks: Vec<Track>,
        start_index: usize,
    },
    /// Play the track with this id if it is in the playlist.
    Play(TrackId),
    Pause,
    Resume,
    /// Pause when playing, resume otherwise.
    Toggle,
    /// Pause and rewind the current track.
    Stop,
    Next,
    Previous,
    /// Jump to an absolute position (milliseconds).
    Seek(u64),
    /// Jump relative to the live position (milliseconds, may be negative).
    SeekBy(i64),
    BeginUserSeek(u64),
    UpdateUserSeek(u64),
    FinishUserSeek,
    CancelUserSeek,
    /// Stop the player thread, fading out over the given duration.
    Quit { fade_out: Duration },
}

/// Everything the controller thread consumes, in arrival order.
#[derive(Debug, Clone)]
pub enum PlayerMsg {
    Command(PlayerCmd),
    Engine(EngineEvent),
    /// Periodic position sample request while playing.
    Tick,
}

impl From<EngineEvent> for PlayerMsg {
    fn from(ev: EngineEvent) -> Self {
        Self::Engine(ev)
    }
}

impl From<PlayerCmd> for PlayerMsg {
    fn from(cmd: PlayerCmd) -> Self {
        Self::Command(cmd)
    }
}

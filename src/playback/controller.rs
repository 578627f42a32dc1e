use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::{DiscontinuityReason, EngineError, EngineEvent, MediaEngine, MediaItem};
use crate::library::{Track, TrackId};

use super::command::{PlayerCmd, PlayerMsg};
use super::playlist::Playlist;
use super::sampler::PositionSampler;
use super::store::{PlayerStatus, StoreWriter};

/// Keeps the playlist, the engine and the state store consistent.
///
/// The controller is the only writer of the store. Commands are applied to the
/// engine first and mirrored into the store optimistically; engine events then
/// confirm or correct that state. The current track is always re-derived from
/// the engine's live item index rather than the index carried by an event, so
/// stale events after quick successive commands cannot select the wrong track.
pub struct PlaybackController<E: MediaEngine> {
    engine: E,
    store: StoreWriter,
    sampler: PositionSampler,
    playlist: Playlist,
    playing: bool,
    user_seek: Option<u64>,
}

impl<E: MediaEngine> PlaybackController<E> {
    pub fn new(engine: E, store: StoreWriter, sampler: PositionSampler) -> Self {
        Self {
            engine,
            store,
            sampler,
            playlist: Playlist::default(),
            playing: false,
            user_seek: None,
        }
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.is_running()
    }

    /// Process one inbox message. Breaks after `Quit`.
    pub fn handle(&mut self, msg: PlayerMsg) -> ControlFlow<()> {
        match msg {
            PlayerMsg::Command(cmd) => return self.apply(cmd),
            PlayerMsg::Engine(ev) => self.handle_event(ev),
            PlayerMsg::Tick => self.sample_position(),
        }
        ControlFlow::Continue(())
    }

    pub fn apply(&mut self, cmd: PlayerCmd) -> ControlFlow<()> {
        match cmd {
            PlayerCmd::SetPlaylist {
                tracks,
                start_index,
            } => self.set_playlist(tracks, start_index),
            PlayerCmd::Play(id) => self.play(id),
            PlayerCmd::Pause => self.pause(),
            PlayerCmd::Resume => self.resume(),
            PlayerCmd::Toggle => self.toggle(),
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::Next => self.next(),
            PlayerCmd::Previous => self.previous(),
            PlayerCmd::Seek(ms) => self.seek(ms),
            PlayerCmd::SeekBy(delta) => self.seek_by(delta),
            PlayerCmd::BeginUserSeek(ms) => self.begin_user_seek(ms),
            PlayerCmd::UpdateUserSeek(ms) => self.update_user_seek(ms),
            PlayerCmd::FinishUserSeek => self.finish_user_seek(),
            PlayerCmd::CancelUserSeek => self.cancel_user_seek(),
            PlayerCmd::Quit { fade_out } => {
                self.shutdown(fade_out);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    pub fn set_playlist(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.clear_user_seek();

        if tracks.is_empty() {
            info!("playlist cleared");
            self.playlist = Playlist::default();
            self.engine.clear();
            self.store.set_current(None, None);
            self.store.set_position(0);
            self.store.set_status(PlayerStatus::Idle);
            return;
        }

        let items = tracks.iter().map(MediaItem::from).collect();
        self.playlist = Playlist::new(tracks, start_index);
        self.engine.set_items(items);

        if let Some(start) = self.playlist.current_index() {
            self.load_first_playable(start);
        }
        // The engine may have settled elsewhere if the start track did not load.
        let index = self
            .engine
            .current_item_index()
            .filter(|&i| i < self.playlist.len())
            .or(self.playlist.current_index());
        if let Some(i) = index {
            self.playlist.select(i);
        }
        info!(
            tracks = self.playlist.len(),
            start = ?index,
            "playlist loaded"
        );

        self.store.set_current(index, self.playlist.current().cloned());
        self.store.set_position(0);
        self.store.set_status(PlayerStatus::Loaded);
    }

    pub fn play(&mut self, id: TrackId) {
        let Some(index) = self.playlist.position_of(id) else {
            debug!(%id, "play: track not in playlist");
            return;
        };
        debug!(%id, index, "play");

        if let Err(e) = self.engine.seek_to_item(index, 0) {
            warn!(%id, error = %e, "cannot seek to track");
            return;
        }
        log_engine_error("prepare", self.engine.prepare());
        log_engine_error("play", self.engine.play());

        self.clear_user_seek();
        self.select(index);
        self.store.set_position(0);
        self.store.set_status(PlayerStatus::Playing);
    }

    pub fn pause(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        debug!("pause");
        self.engine.pause();
        if self.store.status() == PlayerStatus::Playing {
            self.store.set_status(PlayerStatus::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        debug!("resume");
        log_engine_error("play", self.engine.play());
        self.store.set_status(PlayerStatus::Playing);
    }

    pub fn toggle(&mut self) {
        if self.store.status() == PlayerStatus::Playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    /// Pause and rewind the current track.
    pub fn stop(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.pause();
        self.seek(0);
    }

    pub fn next(&mut self) {
        if !self.playlist.has_next() {
            debug!("next: at end of playlist");
            return;
        }
        debug!("next");
        if let Err(e) = self.engine.next_item() {
            warn!(error = %e, "cannot skip forward");
            return;
        }
        self.sync_after_skip();
    }

    pub fn previous(&mut self) {
        if !self.playlist.has_previous() {
            debug!("previous: at start of playlist");
            return;
        }
        debug!("previous");
        if let Err(e) = self.engine.previous_item() {
            warn!(error = %e, "cannot skip back");
            return;
        }
        self.sync_after_skip();
    }

    pub fn seek(&mut self, position_ms: u64) {
        if self.playlist.is_empty() {
            return;
        }
        debug!(position_ms, "seek");
        self.clear_user_seek();
        if let Err(e) = self.engine.seek_to(position_ms) {
            warn!(position_ms, error = %e, "seek failed");
            return;
        }
        self.store.set_position(position_ms);
    }

    /// Seek relative to the live position, clamped to the track bounds.
    pub fn seek_by(&mut self, delta_ms: i64) {
        let Some(track) = self.playlist.current() else {
            return;
        };
        let mut target = self.engine.position_ms().saturating_add_signed(delta_ms);
        if track.duration_ms > 0 {
            target = target.min(track.duration_ms);
        }
        self.seek(target);
    }

    pub fn begin_user_seek(&mut self, target_ms: u64) {
        if self.playlist.is_empty() {
            return;
        }
        self.user_seek = Some(target_ms);
        self.store.set_user_seek(true, Some(target_ms));
    }

    pub fn update_user_seek(&mut self, target_ms: u64) {
        if self.user_seek.is_some() {
            self.user_seek = Some(target_ms);
            self.store.set_user_seek(true, Some(target_ms));
        }
    }

    pub fn finish_user_seek(&mut self) {
        if let Some(target) = self.user_seek {
            self.seek(target);
        }
    }

    pub fn cancel_user_seek(&mut self) {
        self.clear_user_seek();
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        debug!(?event, "engine event");
        match event {
            EngineEvent::IsPlayingChanged(playing) => {
                self.playing = playing;
                self.store.set_playing(playing);
                if playing {
                    if !self.playlist.is_empty() {
                        self.store.set_status(PlayerStatus::Playing);
                    }
                    self.sampler.start();
                } else {
                    if self.store.status() == PlayerStatus::Playing {
                        self.store.set_status(PlayerStatus::Paused);
                    }
                    self.sampler.stop();
                }
            }
            EngineEvent::PositionDiscontinuity {
                position_ms,
                reason,
                ..
            } => {
                if self.user_seek.is_none() {
                    self.store.set_position(position_ms);
                }
                if matches!(
                    reason,
                    DiscontinuityReason::AutoTransition | DiscontinuityReason::Seek
                ) {
                    self.sync_current_from_engine();
                }
            }
            EngineEvent::MediaItemTransition { .. } => self.sync_current_from_engine(),
        }
    }

    /// Sampler tick: copy the engine position into the store while playing.
    pub fn sample_position(&mut self) {
        self.engine.poll();
        if self.playing && self.user_seek.is_none() {
            self.store.set_position(self.engine.position_ms());
        }
    }

    pub fn poll_engine(&mut self) {
        self.engine.poll();
    }

    pub fn shutdown(&mut self, fade_out: Duration) {
        info!(fade_out_ms = fade_out.as_millis(), "player shutting down");
        self.sampler.stop();
        self.engine.shutdown(fade_out);
    }

    fn select(&mut self, index: usize) {
        if let Some(track) = self.playlist.select(index).cloned() {
            self.store.set_current(Some(index), Some(track));
        }
    }

    /// Seek the engine to `start`, or to the nearest track that loads: later
    /// tracks first, then earlier ones.
    fn load_first_playable(&mut self, start: usize) {
        let len = self.playlist.len();
        for index in (start..len).chain((0..start).rev()) {
            match self.engine.seek_to_item(index, 0) {
                Ok(()) => return,
                Err(e) => warn!(index, error = %e, "cannot load track"),
            }
        }
        warn!("no track in the playlist could be loaded");
    }

    fn sync_after_skip(&mut self) {
        self.sync_current_from_engine();
        self.store.set_position(0);
    }

    fn sync_current_from_engine(&mut self) {
        let Some(index) = self.engine.current_item_index() else {
            return;
        };
        if Some(index) == self.playlist.current_index() {
            return;
        }
        if index >= self.playlist.len() {
            debug!(index, len = self.playlist.len(), "ignoring out-of-range engine index");
            return;
        }
        self.select(index);
    }

    fn clear_user_seek(&mut self) {
        self.user_seek = None;
        self.store.set_user_seek(false, None);
    }
}

fn log_engine_error(op: &str, result: Result<(), EngineError>) {
    if let Err(e) = result {
        warn!(op, error = %e, "engine command failed");
    }
}

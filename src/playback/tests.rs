use super::*;
use crate::audio::{
    DiscontinuityReason, EngineError, EngineEvent, EngineEvents, MediaEngine, MediaItem,
};
use crate::config::PlaybackSettings;
use crate::library::{CatalogEntry, Track, TrackId};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct MockState {
    items: Vec<MediaItem>,
    index: Option<usize>,
    playing: bool,
    position_ms: u64,
    finish_pending: bool,
    /// Items that fail to load.
    broken: Vec<usize>,
    calls: Vec<&'static str>,
}

/// Engine double that reports events the way an asynchronous player would.
struct MockEngine {
    state: Arc<Mutex<MockState>>,
    events: EngineEvents,
}

impl MockEngine {
    fn new(events: EngineEvents) -> (Self, Arc<Mutex<MockState>>) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: state.clone(),
                events,
            },
            state,
        )
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState, &mut Vec<EngineEvent>) -> R) -> R {
        let mut out = Vec::new();
        let r = {
            let mut s = self.state.lock().unwrap();
            f(&mut s, &mut out)
        };
        for ev in out {
            self.events.emit(ev);
        }
        r
    }
}

fn mock_skip_to(
    s: &mut MockState,
    out: &mut Vec<EngineEvent>,
    candidates: impl Iterator<Item = usize>,
) -> Result<(), EngineError> {
    let mut result = Ok(());
    for index in candidates {
        match mock_seek_to_item(s, out, index, 0) {
            Ok(()) => return Ok(()),
            Err(e) => result = Err(e),
        }
    }
    result
}

fn mock_seek_to_item(
    s: &mut MockState,
    out: &mut Vec<EngineEvent>,
    index: usize,
    position_ms: u64,
) -> Result<(), EngineError> {
    let Some(item) = s.items.get(index) else {
        return Err(EngineError::NoSuchItem(index));
    };
    if s.broken.contains(&index) {
        return Err(EngineError::Decode {
            path: item.locator.clone().into(),
            reason: "unsupported format".into(),
        });
    }
    let changed = s.index != Some(index);
    s.index = Some(index);
    s.position_ms = position_ms;
    if changed {
        out.push(EngineEvent::MediaItemTransition {
            item_index: Some(index),
        });
    }
    out.push(EngineEvent::PositionDiscontinuity {
        position_ms,
        item_index: Some(index),
        reason: DiscontinuityReason::Seek,
    });
    Ok(())
}

impl MediaEngine for MockEngine {
    fn set_items(&mut self, items: Vec<MediaItem>) {
        self.with(|s, out| {
            s.calls.push("set_items");
            s.index = if items.is_empty() { None } else { Some(0) };
            s.items = items;
            s.position_ms = 0;
            if s.playing {
                s.playing = false;
                out.push(EngineEvent::IsPlayingChanged(false));
            }
        });
    }

    fn clear(&mut self) {
        self.with(|s, _| s.calls.push("clear"));
        self.set_items(Vec::new());
    }

    fn seek_to_item(&mut self, index: usize, position_ms: u64) -> Result<(), EngineError> {
        self.with(|s, out| {
            s.calls.push("seek_to_item");
            mock_seek_to_item(s, out, index, position_ms)
        })
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        self.with(|s, out| {
            s.calls.push("seek_to");
            s.position_ms = position_ms;
            out.push(EngineEvent::PositionDiscontinuity {
                position_ms,
                item_index: s.index,
                reason: DiscontinuityReason::Seek,
            });
            Ok(())
        })
    }

    fn prepare(&mut self) -> Result<(), EngineError> {
        self.with(|s, _| s.calls.push("prepare"));
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.with(|s, out| {
            s.calls.push("play");
            if !s.playing {
                s.playing = true;
                out.push(EngineEvent::IsPlayingChanged(true));
            }
            Ok(())
        })
    }

    fn pause(&mut self) {
        self.with(|s, out| {
            s.calls.push("pause");
            if s.playing {
                s.playing = false;
                out.push(EngineEvent::IsPlayingChanged(false));
            }
        });
    }

    fn next_item(&mut self) -> Result<(), EngineError> {
        self.with(|s, out| {
            s.calls.push("next_item");
            let Some(i) = s.index else {
                return Ok(());
            };
            let len = s.items.len();
            mock_skip_to(s, out, i + 1..len)
        })
    }

    fn previous_item(&mut self) -> Result<(), EngineError> {
        self.with(|s, out| {
            s.calls.push("previous_item");
            let Some(i) = s.index else {
                return Ok(());
            };
            mock_skip_to(s, out, (0..i).rev())
        })
    }

    fn current_item_index(&self) -> Option<usize> {
        self.state.lock().unwrap().index
    }

    fn position_ms(&self) -> u64 {
        self.state.lock().unwrap().position_ms
    }

    fn poll(&mut self) {
        self.with(|s, out| {
            if !std::mem::take(&mut s.finish_pending) {
                return;
            }
            let next = s.index.map_or(0, |i| i + 1);
            if next < s.items.len() {
                s.index = Some(next);
                s.position_ms = 0;
                out.push(EngineEvent::MediaItemTransition {
                    item_index: Some(next),
                });
                out.push(EngineEvent::PositionDiscontinuity {
                    position_ms: 0,
                    item_index: Some(next),
                    reason: DiscontinuityReason::AutoTransition,
                });
            } else if s.playing {
                s.playing = false;
                out.push(EngineEvent::IsPlayingChanged(false));
            }
        });
    }
}

fn track(id: u64, title: &str) -> Track {
    Track::from_entry(
        CatalogEntry {
            id,
            title: Some(title.to_string()),
            artist: Some("Artist".to_string()),
            duration_ms: 200_000,
            data: format!("/music/{title}.mp3"),
            ..CatalogEntry::default()
        },
        None,
    )
    .unwrap()
}

fn abc() -> Vec<Track> {
    vec![track(1, "A"), track(2, "B"), track(3, "C")]
}

struct Harness {
    controller: PlaybackController<MockEngine>,
    engine: Arc<Mutex<MockState>>,
    view: PlaybackView,
    rx: Receiver<PlayerMsg>,
}

impl Harness {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel::<PlayerMsg>();
        let (engine, state) = MockEngine::new(EngineEvents::from_sender(tx.clone()));
        let (writer, view) = store::channel();
        // Long interval: tests drive sampling by hand.
        let sampler = PositionSampler::new(Duration::from_secs(3600), tx);
        Self {
            controller: PlaybackController::new(engine, writer, sampler),
            engine: state,
            view,
            rx,
        }
    }

    /// Feed every pending engine event back into the controller.
    fn pump(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(PlayerMsg::Engine(ev)) => self.controller.handle_event(ev),
                Ok(_) => {}
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
    }

    fn loaded(tracks: Vec<Track>, start: usize) -> Self {
        Self::loaded_with_broken(tracks, start, &[])
    }

    fn loaded_with_broken(tracks: Vec<Track>, start: usize, broken: &[usize]) -> Self {
        let mut h = Self::new();
        h.engine.lock().unwrap().broken = broken.to_vec();
        h.controller.set_playlist(tracks, start);
        h.pump();
        h
    }

    fn current_id(&self) -> Option<TrackId> {
        self.view.current_track().map(|t| t.id)
    }

    fn engine_calls(&self) -> Vec<&'static str> {
        self.engine.lock().unwrap().calls.clone()
    }
}

#[test]
fn playlist_clamps_start_index() {
    assert_eq!(Playlist::clamp_index(0, 0), None);
    assert_eq!(Playlist::clamp_index(5, 0), None);
    assert_eq!(Playlist::clamp_index(1, 3), Some(1));
    assert_eq!(Playlist::clamp_index(7, 3), Some(2));
}

#[test]
fn playlist_navigation_is_bounded() {
    let mut p = Playlist::new(abc(), 0);
    assert!(p.has_next());
    assert!(!p.has_previous());
    assert!(p.select(3).is_none());
    assert_eq!(p.current_index(), Some(0));
    assert_eq!(p.select(2).map(|t| t.id), Some(TrackId(3)));
    assert!(!p.has_next());
    assert_eq!(p.position_of(TrackId(2)), Some(1));
    assert_eq!(p.position_of(TrackId(99)), None);
}

#[test]
fn set_playlist_loads_engine_and_selects_clamped_start() {
    let h = Harness::loaded(abc(), 7);

    let s = h.view.snapshot();
    assert_eq!(s.current_index, Some(2));
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert_eq!(s.status, PlayerStatus::Loaded);
    assert_eq!(s.position_ms, 0);
    assert!(!s.is_playing);

    let engine = h.engine.lock().unwrap();
    assert_eq!(engine.items.len(), 3);
    assert_eq!(engine.index, Some(2));
    assert!(!engine.playing);
    assert!(!engine.calls.contains(&"play"));
}

#[test]
fn empty_playlist_is_idle_and_commands_are_noops() {
    let mut h = Harness::loaded(Vec::new(), 3);
    assert_eq!(h.view.status(), PlayerStatus::Idle);
    assert_eq!(h.view.current_track().map(|t| t.id), None);
    assert_eq!(h.view.current_index(), None);

    h.controller.play(TrackId(1));
    h.controller.resume();
    h.controller.pause();
    h.controller.next();
    h.controller.previous();
    h.controller.seek(5000);
    h.controller.seek_by(1000);
    h.controller.begin_user_seek(10);
    h.pump();

    assert_eq!(h.engine_calls(), vec!["clear", "set_items"]);
    let s = h.view.snapshot();
    assert_eq!(s.status, PlayerStatus::Idle);
    assert!(!s.is_playing);
    assert!(!s.user_seeking);
    assert_eq!(s.position_ms, 0);
}

#[test]
fn play_then_next_stops_at_the_end() {
    let mut h = Harness::loaded(abc(), 0);

    h.controller.play(TrackId(2));
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(2)));
    assert!(h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Playing);

    h.controller.next();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert_eq!(h.view.current_index(), Some(2));

    h.controller.next();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert!(h.view.is_playing());
}

#[test]
fn previous_at_start_is_noop() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.previous();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(1)));
    assert!(!h.engine_calls().contains(&"previous_item"));

    h.controller.next();
    h.controller.previous();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(1)));
}

#[test]
fn next_and_previous_skip_undecodable_tracks() {
    let mut h = Harness::loaded_with_broken(abc(), 0, &[1]);
    assert_eq!(h.current_id(), Some(TrackId(1)));

    h.controller.next();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert_eq!(h.view.current_index(), Some(2));
    assert_eq!(h.engine.lock().unwrap().index, Some(2));

    h.controller.previous();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(1)));
    assert_eq!(h.engine.lock().unwrap().index, Some(0));
}

#[test]
fn next_stays_put_when_nothing_later_loads() {
    let mut h = Harness::loaded_with_broken(abc(), 0, &[1, 2]);

    h.controller.next();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(1)));
    assert_eq!(h.view.current_index(), Some(0));
    assert_eq!(h.engine.lock().unwrap().index, Some(0));
}

#[test]
fn undecodable_start_track_selects_what_the_engine_loaded() {
    let mut h = Harness::loaded_with_broken(abc(), 1, &[1]);
    assert_eq!(h.view.current_index(), Some(2));
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert_eq!(h.controller.playlist().current_index(), Some(2));
    assert_eq!(h.engine.lock().unwrap().index, Some(2));
    assert_eq!(h.view.status(), PlayerStatus::Loaded);

    h.controller.resume();
    h.pump();
    assert!(h.view.is_playing());
    assert_eq!(h.current_id(), Some(TrackId(3)));
    assert_eq!(h.engine.lock().unwrap().index, Some(2));
}

#[test]
fn undecodable_tail_falls_back_to_earlier_track() {
    let h = Harness::loaded_with_broken(abc(), 1, &[1, 2]);
    assert_eq!(h.current_id(), Some(TrackId(1)));
    assert_eq!(h.engine.lock().unwrap().index, Some(0));
}

#[test]
fn play_unknown_id_changes_nothing() {
    let mut h = Harness::loaded(abc(), 1);
    let calls_before = h.engine_calls().len();

    h.controller.play(TrackId(42));
    h.pump();

    assert_eq!(h.engine_calls().len(), calls_before);
    assert_eq!(h.current_id(), Some(TrackId(2)));
    assert_eq!(h.view.status(), PlayerStatus::Loaded);
    assert!(!h.view.is_playing());
}

#[test]
fn seek_while_loaded_stays_stopped() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.seek(5000);
    h.pump();

    assert_eq!(h.view.position_ms(), 5000);
    assert!(!h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Loaded);
    assert_eq!(h.engine.lock().unwrap().position_ms, 5000);
}

#[test]
fn seek_while_paused_keeps_paused() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();
    h.controller.pause();
    h.pump();
    assert_eq!(h.view.status(), PlayerStatus::Paused);

    h.controller.seek(5000);
    h.pump();

    assert_eq!(h.view.position_ms(), 5000);
    assert!(!h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Paused);
    assert!(!h.engine.lock().unwrap().playing);
    assert_eq!(h.engine.lock().unwrap().position_ms, 5000);
}

#[test]
fn seek_by_clamps_to_track_bounds() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.seek(3000);
    h.controller.seek_by(-10_000);
    assert_eq!(h.view.position_ms(), 0);

    h.controller.seek_by(500_000);
    assert_eq!(h.view.position_ms(), 200_000);
}

#[test]
fn pause_resume_and_toggle_follow_engine_state() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();

    h.controller.pause();
    h.pump();
    assert!(!h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Paused);

    h.controller.resume();
    h.pump();
    assert!(h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Playing);

    h.controller.toggle();
    h.pump();
    assert!(!h.view.is_playing());

    h.controller.toggle();
    h.pump();
    assert!(h.view.is_playing());
}

#[test]
fn pause_before_play_keeps_loaded_status() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.pause();
    h.pump();
    assert_eq!(h.view.status(), PlayerStatus::Loaded);
}

#[test]
fn stop_pauses_and_rewinds() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();
    h.engine.lock().unwrap().position_ms = 42_000;
    h.controller.sample_position();
    assert_eq!(h.view.position_ms(), 42_000);

    h.controller.stop();
    h.pump();
    assert!(!h.view.is_playing());
    assert_eq!(h.view.position_ms(), 0);
    assert_eq!(h.current_id(), Some(TrackId(1)));
}

#[test]
fn sampler_runs_only_while_playing() {
    let mut h = Harness::loaded(abc(), 0);
    assert!(!h.controller.is_sampling());

    h.controller.play(TrackId(1));
    assert!(!h.controller.is_sampling());
    h.pump();
    assert!(h.controller.is_sampling());

    h.controller.pause();
    h.pump();
    assert!(!h.controller.is_sampling());
}

#[test]
fn sampling_copies_engine_position_only_while_playing() {
    let mut h = Harness::loaded(abc(), 0);
    h.engine.lock().unwrap().position_ms = 1234;
    h.controller.sample_position();
    assert_eq!(h.view.position_ms(), 0);

    h.controller.play(TrackId(1));
    h.pump();
    h.engine.lock().unwrap().position_ms = 1234;
    h.controller.sample_position();
    assert_eq!(h.view.position_ms(), 1234);
}

#[test]
fn auto_transition_moves_to_next_track() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();
    h.engine.lock().unwrap().position_ms = 199_000;
    h.controller.sample_position();

    h.engine.lock().unwrap().finish_pending = true;
    h.controller.poll_engine();
    h.pump();

    assert_eq!(h.current_id(), Some(TrackId(2)));
    assert_eq!(h.view.current_index(), Some(1));
    assert_eq!(h.view.position_ms(), 0);
    assert!(h.view.is_playing());
}

#[test]
fn end_of_playlist_pauses_and_stops_sampling() {
    let mut h = Harness::loaded(abc(), 2);
    h.controller.play(TrackId(3));
    h.pump();

    h.engine.lock().unwrap().finish_pending = true;
    h.controller.poll_engine();
    h.pump();

    assert!(!h.view.is_playing());
    assert_eq!(h.view.status(), PlayerStatus::Paused);
    assert!(!h.controller.is_sampling());
    assert_eq!(h.current_id(), Some(TrackId(3)));
}

#[test]
fn out_of_range_engine_index_is_ignored() {
    let mut h = Harness::loaded(abc(), 1);
    h.engine.lock().unwrap().index = Some(10);

    h.controller.handle_event(EngineEvent::MediaItemTransition {
        item_index: Some(10),
    });
    h.controller.handle_event(EngineEvent::PositionDiscontinuity {
        position_ms: 0,
        item_index: Some(10),
        reason: DiscontinuityReason::AutoTransition,
    });

    assert_eq!(h.current_id(), Some(TrackId(2)));
    assert_eq!(h.view.current_index(), Some(1));
}

#[test]
fn stale_event_index_defers_to_live_engine_index() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.next();
    h.controller.next();
    h.pump();
    assert_eq!(h.current_id(), Some(TrackId(3)));

    h.controller.handle_event(EngineEvent::MediaItemTransition {
        item_index: Some(1),
    });
    assert_eq!(h.current_id(), Some(TrackId(3)));
}

#[test]
fn user_seek_suppresses_sampling_until_finished() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();

    h.controller.begin_user_seek(9000);
    h.controller.update_user_seek(12_000);
    assert_eq!(h.view.user_seek(), (true, Some(12_000)));

    h.engine.lock().unwrap().position_ms = 100;
    h.controller.sample_position();
    assert_eq!(h.view.position_ms(), 0);

    h.controller.finish_user_seek();
    h.pump();
    assert_eq!(h.view.user_seek(), (false, None));
    assert_eq!(h.view.position_ms(), 12_000);
    assert_eq!(h.engine.lock().unwrap().position_ms, 12_000);
}

#[test]
fn cancelled_user_seek_does_not_touch_engine() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.begin_user_seek(9000);
    h.controller.cancel_user_seek();
    h.controller.finish_user_seek();
    h.pump();

    assert_eq!(h.view.user_seek(), (false, None));
    assert!(!h.engine_calls().contains(&"seek_to"));
}

#[test]
fn update_without_begin_is_ignored() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.update_user_seek(500);
    assert_eq!(h.view.user_seek(), (false, None));
}

#[test]
fn replacing_playlist_resets_position_and_selection() {
    let mut h = Harness::loaded(abc(), 0);
    h.controller.play(TrackId(1));
    h.pump();
    h.controller.seek(30_000);
    h.pump();

    h.controller.set_playlist(vec![track(9, "Z")], 0);
    h.pump();

    let s = h.view.snapshot();
    assert_eq!(s.current_track.map(|t| t.id), Some(TrackId(9)));
    assert_eq!(s.position_ms, 0);
    assert_eq!(s.status, PlayerStatus::Loaded);
    assert!(!s.is_playing);
    assert!(!h.controller.is_sampling());
}

#[test]
fn quit_breaks_the_loop() {
    let mut h = Harness::loaded(abc(), 0);
    assert!(h.controller.apply(PlayerCmd::Next).is_continue());
    assert!(h.controller.handle(PlayerMsg::Tick).is_continue());
    assert!(
        h.controller
            .apply(PlayerCmd::Quit {
                fade_out: Duration::ZERO
            })
            .is_break()
    );
}

#[test]
fn store_skips_unchanged_writes() {
    let (writer, view) = store::channel();
    let rx = view.subscribe();

    writer.set_playing(false);
    writer.set_position(0);
    writer.set_status(PlayerStatus::Idle);
    writer.set_user_seek(false, None);
    writer.set_current(None, None);
    assert!(rx.try_recv().is_err());

    writer.set_position(10);
    writer.set_position(10);
    assert!(matches!(rx.try_recv(), Ok(StateChange::Position(10))));
    assert!(rx.try_recv().is_err());
}

#[test]
fn store_delivers_changes_in_write_order() {
    let (writer, view) = store::channel();
    let a = view.subscribe();
    let b = view.clone().subscribe();

    writer.set_current(Some(0), Some(track(1, "A")));
    writer.set_playing(true);
    writer.set_position(250);
    writer.set_status(PlayerStatus::Playing);

    for rx in [a, b] {
        let got: Vec<StateChange> = rx.try_iter().collect();
        assert_eq!(got.len(), 4);
        assert!(matches!(&got[0], StateChange::CurrentTrack(Some(t)) if t.id == TrackId(1)));
        assert!(matches!(got[1], StateChange::IsPlaying(true)));
        assert!(matches!(got[2], StateChange::Position(250)));
        assert!(matches!(got[3], StateChange::Status(PlayerStatus::Playing)));
    }
}

#[test]
fn store_refreshes_retagged_current_track() {
    let (writer, view) = store::channel();
    writer.set_current(Some(0), Some(track(1, "A")));
    let rx = view.subscribe();

    writer.set_current(Some(3), Some(track(1, "A")));
    assert!(rx.try_recv().is_err());
    assert_eq!(view.current_index(), Some(3));

    writer.set_current(Some(3), Some(track(1, "A (Remastered)")));
    assert!(matches!(
        rx.try_recv(),
        Ok(StateChange::CurrentTrack(Some(t))) if t.title == "A (Remastered)"
    ));
    assert_eq!(view.current_track().map(|t| t.title), Some("A (Remastered)".to_string()));

    writer.set_current(None, None);
    assert!(matches!(rx.try_recv(), Ok(StateChange::CurrentTrack(None))));
}

#[test]
fn rescan_with_retagged_track_updates_current() {
    let mut h = Harness::loaded(abc(), 0);
    let rx = h.view.subscribe();

    h.controller.set_playlist(vec![track(1, "A (Remastered)")], 0);
    h.pump();

    assert_eq!(h.current_id(), Some(TrackId(1)));
    assert_eq!(
        h.view.current_track().map(|t| t.title),
        Some("A (Remastered)".to_string())
    );
    assert!(rx
        .try_iter()
        .any(|c| matches!(c, StateChange::CurrentTrack(Some(t)) if t.title == "A (Remastered)")));
}

#[test]
fn store_prunes_dropped_subscribers() {
    let (writer, view) = store::channel();
    let kept = view.subscribe();
    drop(view.subscribe());
    assert_eq!(view.subscriber_count(), 2);

    writer.set_playing(true);
    assert_eq!(view.subscriber_count(), 1);
    assert!(matches!(kept.try_recv(), Ok(StateChange::IsPlaying(true))));
}

#[test]
fn sampler_ticks_until_stopped() {
    let (tx, rx) = mpsc::channel();
    let mut sampler = PositionSampler::new(Duration::from_millis(5), tx);
    assert!(!sampler.is_running());

    sampler.start();
    sampler.start();
    assert!(sampler.is_running());
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)),
        Ok(PlayerMsg::Tick)
    ));

    sampler.stop();
    assert!(!sampler.is_running());
}

fn wait_until(view: &PlaybackView, what: impl Fn(&PlaybackState) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if what(&view.snapshot()) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn service_runs_commands_on_player_thread() {
    let settings = PlaybackSettings {
        position_interval_ms: 10,
        ..PlaybackSettings::default()
    };
    let service = PlayerService::spawn(&settings, |events| Ok(MockEngine::new(events).0)).unwrap();
    let view = service.view();
    let changes = view.subscribe();

    service.set_playlist(abc(), 0).unwrap();
    service.play(TrackId(2)).unwrap();
    assert!(wait_until(&view, |s| s.is_playing
        && s.current_track.as_ref().map(|t| t.id) == Some(TrackId(2))));

    service.next().unwrap();
    assert!(wait_until(&view, |s| s.current_index == Some(2)));

    service.pause().unwrap();
    assert!(wait_until(&view, |s| s.status == PlayerStatus::Paused));

    service.quit(Duration::ZERO);
    assert!(matches!(service.pause(), Err(PlayerError::Disconnected)));
    assert!(changes.try_iter().count() > 0);
}

#[test]
fn service_reports_engine_startup_failure() {
    let result = PlayerService::spawn(&PlaybackSettings::default(), |_events| {
        Err::<MockEngine, _>(EngineError::Output("no device".into()))
    });
    assert!(matches!(
        result,
        Err(PlayerError::Engine(EngineError::Output(_)))
    ));
}

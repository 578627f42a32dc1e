use std::thread;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::config::AudioSettings;

use super::clock::PlayClock;
use super::engine::{
    DiscontinuityReason, EngineError, EngineEvent, EngineEvents, MediaEngine, MediaItem,
};
use super::sink::create_sink_at;

/// A [`MediaEngine`] on top of rodio: one `Sink` per loaded item.
///
/// `OutputStream` must stay on the thread that opened it, so the engine is
/// built inside the player thread.
pub struct RodioEngine {
    stream: OutputStream,
    settings: AudioSettings,
    events: EngineEvents,
    items: Vec<MediaItem>,
    index: Option<usize>,
    sink: Option<Sink>,
    playing: bool,
    clock: PlayClock,
}

impl RodioEngine {
    pub fn open(settings: AudioSettings, events: EngineEvents) -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            settings,
            events,
            items: Vec::new(),
            index: None,
            sink: None,
            playing: false,
            clock: PlayClock::default(),
        })
    }

    fn set_playing(&mut self, playing: bool) {
        if self.playing != playing {
            self.playing = playing;
            self.events.emit(EngineEvent::IsPlayingChanged(playing));
        }
    }

    /// Build a sink for `index` at `start`, replacing the current one. Keeps
    /// the current play/pause state.
    fn load(&mut self, index: usize, start: Duration) -> Result<(), EngineError> {
        let item = self.items.get(index).ok_or(EngineError::NoSuchItem(index))?;
        let new_sink = create_sink_at(&self.stream, item, start)?;
        // Keep the default volume sane even if crossfade is disabled.
        new_sink.set_volume(1.0);

        let switching_item = self.index != Some(index);
        self.swap_sink(new_sink, switching_item);
        self.index = Some(index);
        self.clock.reset_to(start, self.playing);
        Ok(())
    }

    fn swap_sink(&mut self, new_sink: Sink, crossfade: bool) {
        let crossfade_ms = self.settings.crossfade_ms;
        let steps = self.settings.crossfade_steps.max(1);

        if let Some(old_sink) = self.sink.take() {
            if self.playing && crossfade && crossfade_ms > 0 {
                old_sink.set_volume(1.0);
                new_sink.set_volume(0.0);
                new_sink.play();

                // Short blocking fade; audio keeps flowing in rodio's mixer thread.
                for step in 1..=steps {
                    let t = step as f32 / steps as f32;
                    old_sink.set_volume(1.0 - t);
                    new_sink.set_volume(t);
                    thread::sleep(Duration::from_millis((crossfade_ms / steps).max(1)));
                }
            }
            old_sink.stop();
        }

        if self.playing {
            new_sink.play();
        }
        self.sink = Some(new_sink);
    }

    fn stop_sink(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
    }

    /// The current item ran out: move to the next decodable one, or stop at
    /// the end of the list.
    fn advance_after_end(&mut self) {
        let mut next = self.index.map_or(0, |i| i + 1);

        while next < self.items.len() {
            match self.load(next, Duration::ZERO) {
                Ok(()) => {
                    self.events.emit(EngineEvent::MediaItemTransition {
                        item_index: Some(next),
                    });
                    self.events.emit(EngineEvent::PositionDiscontinuity {
                        position_ms: 0,
                        item_index: Some(next),
                        reason: DiscontinuityReason::AutoTransition,
                    });
                    return;
                }
                Err(e) => {
                    warn!(index = next, error = %e, "skipping undecodable item");
                    next += 1;
                }
            }
        }

        debug!("end of playlist");
        self.clock.pause();
        self.stop_sink();
        self.set_playing(false);
    }

    /// Seek to the first candidate that loads. Returns the last failure when
    /// none does; the current item is then unchanged.
    fn skip_to(&mut self, candidates: impl Iterator<Item = usize>) -> Result<(), EngineError> {
        let mut result = Ok(());
        for index in candidates {
            match self.seek_to_item(index, 0) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(index, error = %e, "skipping undecodable item");
                    result = Err(e);
                }
            }
        }
        result
    }

    fn emit_seek(&self) {
        self.events.emit(EngineEvent::PositionDiscontinuity {
            position_ms: self.clock.elapsed_ms(),
            item_index: self.index,
            reason: DiscontinuityReason::Seek,
        });
    }
}

impl MediaEngine for RodioEngine {
    fn set_items(&mut self, items: Vec<MediaItem>) {
        self.clock.pause();
        self.stop_sink();
        self.set_playing(false);
        self.index = if items.is_empty() { None } else { Some(0) };
        self.items = items;
        self.clock.reset_to(Duration::ZERO, false);
    }

    fn clear(&mut self) {
        self.set_items(Vec::new());
    }

    fn seek_to_item(&mut self, index: usize, position_ms: u64) -> Result<(), EngineError> {
        let changed = self.index != Some(index);
        self.load(index, Duration::from_millis(position_ms))?;
        if changed {
            self.events.emit(EngineEvent::MediaItemTransition {
                item_index: Some(index),
            });
        }
        self.emit_seek();
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u64) -> Result<(), EngineError> {
        let Some(index) = self.index else {
            return Ok(());
        };
        // Scrubbing rebuilds the sink and skips into the file.
        self.load(index, Duration::from_millis(position_ms))?;
        self.emit_seek();
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), EngineError> {
        match (self.index, self.sink.is_some()) {
            (Some(index), false) => self.load(index, self.clock.elapsed()),
            _ => Ok(()),
        }
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.prepare()?;
        let Some(sink) = self.sink.as_ref() else {
            return Ok(());
        };
        sink.play();
        self.clock.start();
        self.set_playing(true);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
        self.clock.pause();
        self.set_playing(false);
    }

    fn next_item(&mut self) -> Result<(), EngineError> {
        let Some(i) = self.index else {
            return Ok(());
        };
        let len = self.items.len();
        self.skip_to(i + 1..len)
    }

    fn previous_item(&mut self) -> Result<(), EngineError> {
        let Some(i) = self.index else {
            return Ok(());
        };
        self.skip_to((0..i).rev())
    }

    fn current_item_index(&self) -> Option<usize> {
        self.index
    }

    fn position_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    fn poll(&mut self) {
        let finished = self.playing && self.sink.as_ref().is_some_and(Sink::empty);
        if finished {
            self.advance_after_end();
        }
    }

    fn shutdown(&mut self, fade_out: Duration) {
        if let Some(sink) = self.sink.as_ref() {
            fade_out_sink(sink, fade_out);
        }
        self.stop_sink();
        self.set_playing(false);
    }
}

fn fade_out_sink(sink: &Sink, fade_out: Duration) {
    let fade_out_ms = u64::try_from(fade_out.as_millis()).unwrap_or(u64::MAX);
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    let start = sink.volume();
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(start * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

//! Utilities for creating `rodio` sinks from media items.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::engine::{EngineError, MediaItem};

/// Create a paused `Sink` for `item` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    item: &MediaItem,
    start_at: Duration,
) -> Result<Sink, EngineError> {
    let path = PathBuf::from(&item.locator);
    let file = File::open(&path).map_err(|source| EngineError::Open {
        path: path.clone(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| EngineError::Decode {
            path,
            reason: e.to_string(),
        })?
        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(sink)
}

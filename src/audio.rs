//! Audio engine boundary.
//!
//! The playback controller drives a [`MediaEngine`] and learns about what the
//! engine did through [`EngineEvent`]s delivered on a channel. [`RodioEngine`]
//! is the concrete engine used by the binary.

mod clock;
mod engine;
mod rodio_engine;
mod sink;

pub use clock::PlayClock;
pub use engine::*;
pub use rodio_engine::RodioEngine;

//! Headless music player core: a catalog index over local audio files, a
//! playback controller driving an audio engine, and an observable playback
//! state store.

pub mod audio;
pub mod config;
pub mod library;
pub mod mpris;
pub mod playback;

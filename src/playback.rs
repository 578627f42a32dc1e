//! Playback core: the playlist, the observable state store and the controller
//! that keeps both consistent with a [`MediaEngine`](crate::audio::MediaEngine).
//!
//! Only [`PlaybackController`] holds the [`StoreWriter`]; everyone else reads
//! through a [`PlaybackView`] or subscribes to [`StateChange`] notifications.
//! [`PlayerService`] runs the controller on its own thread and feeds it user
//! commands, engine events and sampler ticks through one inbox, in arrival
//! order.

mod command;
mod controller;
mod playlist;
mod sampler;
mod service;
pub mod store;

pub use command::{PlayerCmd, PlayerMsg};
pub use controller::PlaybackController;
pub use playlist::Playlist;
pub use sampler::PositionSampler;
pub use service::{PlayerError, PlayerService};
pub use store::{PlaybackState, PlaybackView, PlayerStatus, StateChange, StoreWriter};

#[cfg(test)]
mod tests;

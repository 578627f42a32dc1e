//! Configuration loader and schema types.
//!
//! Settings drive the library scanner, the playback controller, the rodio
//! engine and the MPRIS bridge. See [`Settings`] for the precedence rules.

mod load;
mod schema;

pub use load::{InvalidSettings, default_config_path, resolve_config_path};
pub use schema::*;

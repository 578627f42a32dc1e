use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;

use tracing::info;

use musico::audio::RodioEngine;
use musico::config::Settings;
use musico::library::{Catalog, FsCatalog};
use musico::mpris::{self, ControlCmd, MprisHandle};
use musico::playback::{PlayerError, PlayerService};

pub fn build_catalog(dir: &Path, settings: &Settings) -> Arc<Catalog> {
    info!(dir = %dir.display(), "music library");
    let source = FsCatalog::new(dir, settings.library.clone());
    Arc::new(Catalog::new(source, settings.library.thumbnail_size))
}

/// Start the player thread with the default audio output.
pub fn spawn_player(settings: &Settings) -> Result<PlayerService, PlayerError> {
    let audio = settings.audio.clone();
    PlayerService::spawn(&settings.playback, move |events| {
        RodioEngine::open(audio, events)
    })
}

pub fn start_mpris(settings: &Settings, control_tx: Sender<ControlCmd>) -> MprisHandle {
    if settings.mpris.enabled {
        mpris::spawn_mpris(&settings.mpris.identity, control_tx)
    } else {
        info!("MPRIS disabled");
        MprisHandle::detached()
    }
}

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use musico::config::Settings;
use musico::library::{Catalog, ScanOutcome, Track, format_duration};
use musico::mpris::{ControlCmd, MprisHandle};
use musico::playback::{
    PlaybackState, PlayerError, PlayerService, PlayerStatus, Playlist, StateChange,
};

use super::console::ConsoleCmd;
use super::mpris_sync::{player_cmd, update_mpris};

const CONSOLE_WAIT: Duration = Duration::from_millis(50);

/// Everything the runtime loop reads from.
pub struct Inputs {
    pub control_rx: Receiver<ControlCmd>,
    pub console_rx: Receiver<ConsoleCmd>,
    pub changes: Receiver<StateChange>,
    pub scan: Option<Receiver<ScanOutcome>>,
}

pub struct EventLoop<'a> {
    settings: &'a Settings,
    catalog: Arc<Catalog>,
    player: &'a PlayerService,
    mpris: &'a MprisHandle,
    tracks: Arc<[Track]>,
    autoplay_pending: bool,
}

impl<'a> EventLoop<'a> {
    pub fn new(
        settings: &'a Settings,
        catalog: Arc<Catalog>,
        player: &'a PlayerService,
        mpris: &'a MprisHandle,
    ) -> Self {
        Self {
            settings,
            catalog,
            player,
            mpris,
            tracks: Arc::from(Vec::new()),
            autoplay_pending: settings.playback.autoplay,
        }
    }

    /// Run until a quit request arrives from the console or the media session.
    pub fn run(&mut self, mut inputs: Inputs) -> Result<(), PlayerError> {
        loop {
            if let Some(rx) = inputs.scan.as_ref() {
                match rx.try_recv() {
                    Ok(outcome) => {
                        inputs.scan = None;
                        self.on_scan(outcome)?;
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => inputs.scan = None,
                }
            }

            self.sync_mpris(&inputs.changes);

            while let Ok(cmd) = inputs.control_rx.try_recv() {
                if cmd == ControlCmd::Quit {
                    return Ok(());
                }
                if let Some(player_cmd) = player_cmd(&cmd) {
                    self.player.send(player_cmd)?;
                }
            }

            match inputs.console_rx.recv_timeout(CONSOLE_WAIT) {
                Ok(ConsoleCmd::Quit) => return Ok(()),
                Ok(ConsoleCmd::Rescan) => {
                    if inputs.scan.is_none() {
                        info!("rescanning library");
                        inputs.scan = Some(self.catalog.scan_in_background());
                    }
                }
                Ok(cmd) => self.on_console(cmd)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(CONSOLE_WAIT),
            }
        }
    }

    fn on_scan(&mut self, outcome: ScanOutcome) -> Result<(), PlayerError> {
        let tracks = match outcome {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(error = %e, "library scan failed");
                return Ok(());
            }
        };

        let start = self.settings.playback.start_index;
        self.player.set_playlist(tracks.to_vec(), start)?;

        if std::mem::take(&mut self.autoplay_pending) {
            let first = Playlist::clamp_index(start, tracks.len()).and_then(|i| tracks.get(i));
            if let Some(track) = first {
                self.player.play(track.id)?;
            }
        }
        self.tracks = tracks;
        Ok(())
    }

    fn sync_mpris(&self, changes: &Receiver<StateChange>) {
        let mut dirty = false;
        while let Ok(change) = changes.try_recv() {
            match change {
                StateChange::Position(ms) => self.mpris.set_position_ms(ms),
                _ => dirty = true,
            }
        }
        if dirty {
            update_mpris(self.mpris, &self.player.view().snapshot(), self.tracks.len());
        }
    }

    fn on_console(&self, cmd: ConsoleCmd) -> Result<(), PlayerError> {
        match cmd {
            ConsoleCmd::List => {
                let current = self.player.view().current_index();
                for (i, t) in self.tracks.iter().enumerate() {
                    let marker = if current == Some(i) { '>' } else { ' ' };
                    println!(
                        "{marker}{:>4}  {}  [{}]",
                        i + 1,
                        t.display(),
                        format_duration(t.duration_ms)
                    );
                }
            }
            ConsoleCmd::Play(n) => match self.tracks.get(n - 1) {
                Some(track) => self.player.play(track.id)?,
                None => println!("no track {n} (library has {})", self.tracks.len()),
            },
            ConsoleCmd::Pause => self.player.pause()?,
            ConsoleCmd::Resume => self.player.resume()?,
            ConsoleCmd::Toggle => self.player.toggle()?,
            ConsoleCmd::Next => self.player.next()?,
            ConsoleCmd::Prev => self.player.previous()?,
            ConsoleCmd::Seek(secs) => self.player.seek(secs.saturating_mul(1000))?,
            ConsoleCmd::Status => {
                let state = self.player.view().snapshot();
                println!("{}", status_line(&state, self.tracks.len()));
            }
            ConsoleCmd::Rescan | ConsoleCmd::Quit => {}
        }
        Ok(())
    }
}

pub fn status_line(state: &PlaybackState, playlist_len: usize) -> String {
    let status = match state.status {
        PlayerStatus::Idle => "idle",
        PlayerStatus::Loaded => "stopped",
        PlayerStatus::Playing => "playing",
        PlayerStatus::Paused => "paused",
    };
    match (&state.current_track, state.current_index) {
        (Some(t), Some(i)) => format!(
            "[{status}] {} / {}  {} ({}/{playlist_len})",
            format_duration(state.position_ms),
            format_duration(t.duration_ms),
            t.display(),
            i + 1
        ),
        _ => format!("[{status}] nothing loaded"),
    }
}

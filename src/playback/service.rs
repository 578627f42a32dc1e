use std::io;
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error};

use crate::audio::{EngineError, EngineEvents, MediaEngine};
use crate::config::PlaybackSettings;
use crate::library::{Track, TrackId};

use super::command::{PlayerCmd, PlayerMsg};
use super::controller::PlaybackController;
use super::sampler::PositionSampler;
use super::store::{self, PlaybackView};

/// How long the player thread waits for a message before polling the engine.
const IDLE_POLL: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("player thread is not running")]
    Disconnected,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to start player thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Handle to a [`PlaybackController`] running on its own thread.
pub struct PlayerService {
    tx: Sender<PlayerMsg>,
    view: PlaybackView,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerService {
    /// Start the player thread. The engine is built on that thread by
    /// `make_engine`, and any construction error is returned here.
    pub fn spawn<E, F>(settings: &PlaybackSettings, make_engine: F) -> Result<Self, PlayerError>
    where
        E: MediaEngine + 'static,
        F: FnOnce(EngineEvents) -> Result<E, EngineError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerMsg>();
        let (writer, view) = store::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), EngineError>>(1);
        let interval = Duration::from_millis(settings.position_interval_ms.max(1));
        let inbox = tx.clone();

        let handle = thread::Builder::new()
            .name("musico-player".into())
            .spawn(move || {
                let engine = match make_engine(EngineEvents::from_sender(inbox.clone())) {
                    Ok(engine) => engine,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                let sampler = PositionSampler::new(interval, inbox);
                run(PlaybackController::new(engine, writer, sampler), rx);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e.into());
            }
            Err(_) => {
                let _ = handle.join();
                return Err(PlayerError::Disconnected);
            }
        }

        Ok(Self {
            tx,
            view,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn view(&self) -> PlaybackView {
        self.view.clone()
    }

    pub fn send(&self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        self.tx
            .send(PlayerMsg::Command(cmd))
            .map_err(|_| PlayerError::Disconnected)
    }

    pub fn set_playlist(&self, tracks: Vec<Track>, start_index: usize) -> Result<(), PlayerError> {
        self.send(PlayerCmd::SetPlaylist {
            tracks,
            start_index,
        })
    }

    pub fn play(&self, id: TrackId) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Play(id))
    }

    pub fn pause(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Pause)
    }

    pub fn resume(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Resume)
    }

    pub fn toggle(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Toggle)
    }

    pub fn stop(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Stop)
    }

    pub fn next(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Next)
    }

    pub fn previous(&self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Previous)
    }

    pub fn seek(&self, position_ms: u64) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Seek(position_ms))
    }

    pub fn seek_by(&self, delta_ms: i64) -> Result<(), PlayerError> {
        self.send(PlayerCmd::SeekBy(delta_ms))
    }

    /// Stop the player thread and wait for it. Safe to call more than once.
    pub fn quit(&self, fade_out: Duration) {
        let _ = self.send(PlayerCmd::Quit { fade_out });

        let handle = match self.join.lock() {
            Ok(mut j) => j.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(h) = handle {
            if h.join().is_err() {
                error!("player thread panicked");
            }
        }
    }
}

impl Drop for PlayerService {
    fn drop(&mut self) {
        self.quit(Duration::ZERO);
    }
}

fn run<E: MediaEngine>(mut controller: PlaybackController<E>, rx: Receiver<PlayerMsg>) {
    loop {
        match rx.recv_timeout(IDLE_POLL) {
            Ok(msg) => {
                if controller.handle(msg).is_break() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => controller.poll_engine(),
            Err(RecvTimeoutError::Disconnected) => {
                controller.shutdown(Duration::ZERO);
                break;
            }
        }
    }
    debug!("player thread exited");
}

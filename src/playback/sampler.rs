use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use super::command::PlayerMsg;

/// Periodic position-sampling timer.
///
/// While running it posts [`PlayerMsg::Tick`] into the controller inbox every
/// `interval`. Each run owns its own stop flag, so a stopped timer thread
/// exits on its next wake even if a new run has already started.
#[derive(Debug)]
pub struct PositionSampler {
    interval: Duration,
    tx: Sender<PlayerMsg>,
    stop: Option<Arc<AtomicBool>>,
}

impl PositionSampler {
    pub fn new(interval: Duration, tx: Sender<PlayerMsg>) -> Self {
        Self {
            interval,
            tx,
            stop: None,
        }
    }

    pub fn start(&mut self) {
        if self.stop.is_some() {
            return;
        }
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let tx = self.tx.clone();
        let interval = self.interval;

        thread::spawn(move || {
            loop {
                thread::sleep(interval);
                if thread_stop.load(Ordering::Acquire) || tx.send(PlayerMsg::Tick).is_err() {
                    break;
                }
            }
        });
        self.stop = Some(stop);
    }

    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Release);
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop.is_some()
    }
}

impl Drop for PositionSampler {
    fn drop(&mut self) {
        self.stop();
    }
}

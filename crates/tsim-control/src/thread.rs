//! Running a controller on a background thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use tsim_signal::SignalKey;

use crate::{ControlResult, ControlSender, SignalController, wall_clock};

/// Handle to a running controller thread.
///
/// Dropping the handle asks the thread to stop but does not wait for it.
pub struct ControllerHandle {
    stop:   Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Ask the controller to stop after its current decision.  Returns
    /// immediately.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(t) = &self.thread {
            t.thread().unpark();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop and wait for the thread to exit.  The simulation never needs
    /// this; it is for callers that want a clean shutdown.
    pub fn join(mut self) -> thread::Result<()> {
        self.stop();
        match self.thread.take() {
            Some(t) => t.join(),
            None => Ok(()),
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start `controller` on a named thread.  It publishes one snapshot for
/// `keys` per [`interval`](SignalController::interval) until stopped or
/// until the receiver is dropped.
pub fn spawn_controller<C: SignalController>(
    mut controller: C,
    keys: Vec<SignalKey>,
    sender: ControlSender,
) -> ControlResult<ControllerHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let name = format!("tsim-{}", controller.name());

    let thread = thread::Builder::new().name(name).spawn(move || {
        info!(controller = controller.name(), signals = keys.len(), "controller started");
        let mut sent = 0u64;
        while !flag.load(Ordering::Acquire) {
            let message = controller.decide(&keys, wall_clock());
            if sender.send(message).is_err() {
                debug!("control receiver dropped");
                break;
            }
            sent += 1;
            wait(&flag, controller.interval());
        }
        info!(controller = controller.name(), sent, "controller stopped");
    })?;

    Ok(ControllerHandle { stop, thread: Some(thread) })
}

/// Sleep for `interval` or until `stop` is raised.
fn wait(stop: &AtomicBool, interval: Duration) {
    let deadline = Instant::now() + interval;
    while !stop.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

//! The control channel.
//!
//! An unbounded crossbeam channel carrying [`ControlMessage`]s.  Senders
//! share one counter and stamp and enqueue each message under its lock, so
//! queue order always equals sequence order: a drained batch never holds a
//! message older than one applied by an earlier drain.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::trace;

use tsim_signal::{ApplyStats, ControlMessage, SignalTable};

use crate::{ControlError, ControlResult};

/// Create a connected sender/receiver pair.
pub fn control_channel() -> (ControlSender, ControlReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let sender = ControlSender { tx, seq: Arc::new(Mutex::new(0)) };
    (sender, ControlReceiver { rx })
}

// ── ControlSender ─────────────────────────────────────────────────────────────

/// Producer half.  Cheap to clone; clones share the sequence counter.
#[derive(Clone, Debug)]
pub struct ControlSender {
    tx:  Sender<ControlMessage>,
    seq: Arc<Mutex<u64>>,
}

impl ControlSender {
    /// Stamp `message` with the next sequence number and enqueue it.
    ///
    /// Never blocks on the receiver; concurrent senders wait only for each
    /// other's enqueue.  Fails only once the receiver is gone, in which case
    /// the sequence number is not consumed.
    pub fn send(&self, mut message: ControlMessage) -> ControlResult<u64> {
        let mut last = self.seq.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = *last + 1;
        message.seq = seq;
        self.tx.send(message).map_err(|_| ControlError::Disconnected)?;
        *last = seq;
        Ok(seq)
    }
}

// ── ControlReceiver ───────────────────────────────────────────────────────────

/// Result of one frame's drain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub messages: usize,
    pub applied:  usize,
    pub ignored:  usize,
}

/// Consumer half, owned by the simulation.
#[derive(Debug)]
pub struct ControlReceiver {
    rx: Receiver<ControlMessage>,
}

impl ControlReceiver {
    /// Take every message that was queued when the call started, in sequence
    /// order.  Messages arriving while draining stay queued for the next call.
    pub fn drain(&self) -> Vec<ControlMessage> {
        let queued = self.rx.len();
        let mut out = Vec::with_capacity(queued);
        for _ in 0..queued {
            match self.rx.try_recv() {
                Ok(message) => out.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out.sort_by_key(|m| m.seq);
        out
    }

    /// Drain and apply to `table` in sequence order.  For a key named by
    /// several messages, the latest one wins.
    pub fn drain_into(&self, table: &mut SignalTable) -> DrainStats {
        let messages = self.drain();
        let mut apply = ApplyStats::default();
        for message in &messages {
            apply += table.apply(message);
        }
        if !messages.is_empty() {
            trace!(
                messages = messages.len(),
                applied = apply.applied,
                ignored = apply.ignored,
                "control drained"
            );
        }
        DrainStats {
            messages: messages.len(),
            applied:  apply.applied,
            ignored:  apply.ignored,
        }
    }

    /// Messages currently queued.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

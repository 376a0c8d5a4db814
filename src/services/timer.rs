//! Cancellable deadline timers feeding the instance event queue.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::services::game_logic::InstanceEvent;

/// Deadline kinds a game arms. At most one timer per kind is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Closes the registration window.
    Registration,
    /// Closes the answer window of the current respondent.
    Answer,
}

struct TimerSlot {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl TimerSlot {
    fn new() -> Self {
        Self { epoch: 0, task: None }
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Deadline timers for one game instance.
///
/// A fired timer never touches game state directly: it enqueues an
/// [`InstanceEvent::Timeout`] into the instance queue, so timeouts are
/// serialized with every other event of the game. Arming a kind replaces
/// any previous timer of that kind, and the epoch carried by the fired
/// event lets the handler drop a timeout that lost a race with
/// [`TimerController::cancel`].
pub struct TimerController {
    events: UnboundedSender<InstanceEvent>,
    registration: TimerSlot,
    answer: TimerSlot,
}

impl TimerController {
    /// Create a controller with nothing armed.
    pub fn new(events: UnboundedSender<InstanceEvent>) -> Self {
        Self {
            events,
            registration: TimerSlot::new(),
            answer: TimerSlot::new(),
        }
    }

    fn slot(&self, kind: TimerKind) -> &TimerSlot {
        match kind {
            TimerKind::Registration => &self.registration,
            TimerKind::Answer => &self.answer,
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut TimerSlot {
        match kind {
            TimerKind::Registration => &mut self.registration,
            TimerKind::Answer => &mut self.answer,
        }
    }

    /// Arm `kind` to fire after `after`, replacing any previous timer of
    /// that kind.
    pub fn arm(&mut self, kind: TimerKind, after: Duration) {
        let events = self.events.clone();
        let slot = self.slot_mut(kind);
        slot.abort();
        slot.epoch += 1;
        let epoch = slot.epoch;
        slot.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // The queue is gone once the worker retired; nothing to notify.
            let _ = events.send(InstanceEvent::Timeout { kind, epoch });
        }));
    }

    /// Disarm `kind`. A timeout of that kind already sitting in the queue
    /// becomes stale through the epoch bump.
    pub fn cancel(&mut self, kind: TimerKind) {
        let slot = self.slot_mut(kind);
        slot.abort();
        slot.epoch += 1;
    }

    /// Whether a fired timeout belongs to the latest arming of its kind.
    pub fn is_current(&self, kind: TimerKind, epoch: u64) -> bool {
        self.slot(kind).epoch == epoch
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.registration.abort();
        self.answer.abort();
    }
}

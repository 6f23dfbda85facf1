//! The UI-owning context's message queue.
//!
//! Store callbacks run on the store's threads. They never touch display
//! sinks; they post a `UiEvent` here and the thread that owns the
//! controllers drains the queue.

use crate::health::{Delivery, HealthError, MetricKind};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Work for the UI-owning context.
#[derive(Debug)]
pub enum UiEvent {
    /// A batch from the store for one subscription.
    Delivery {
        kind: MetricKind,
        /// Identity of the query that produced the batch
        generation: u64,
        delivery: Delivery,
    },
    /// The answer to an authorization request.
    AuthorizationCompleted(Result<(), HealthError>),
    /// The user pressed the start/stop button.
    ToggleRequested,
    /// Leave the event loop.
    Shutdown,
}

/// Queue owned by the UI context. Senders can be handed to any thread.
pub struct UiQueue {
    sender: Sender<UiEvent>,
    receiver: Receiver<UiEvent>,
}

impl UiQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// A handle other threads use to post events.
    pub fn sender(&self) -> Sender<UiEvent> {
        self.sender.clone()
    }

    /// Take an event without blocking.
    pub fn try_recv(&self) -> Option<UiEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<UiEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            // The queue holds its own sender, so it never disconnects.
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for UiQueue {
    fn default() -> Self {
        Self::new()
    }
}

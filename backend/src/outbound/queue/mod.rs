//! Bounded queue between request handlers and the event log.
//!
//! [`ChannelSearchEventSink`] implements the emit-and-forget
//! [`SearchEventSink`] port over a bounded `tokio::mpsc` channel. A
//! [`SearchEventWorker`] drains the channel into an [`EventLog`]. When the
//! channel is full or the worker has gone away the event is dropped with a
//! debug log so the request path never waits on persistence.

use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::ActivityEvent;
use crate::domain::ports::{EventLog, SearchEventSink};

/// Default number of queued search events before new ones are dropped.
pub const DEFAULT_SEARCH_EVENT_CAPACITY: usize = 1024;

/// Sending half of the search event queue.
#[derive(Debug, Clone)]
pub struct ChannelSearchEventSink {
    sender: Sender<ActivityEvent>,
}

impl ChannelSearchEventSink {
    /// Create a sink and the worker that persists its events into `log`.
    ///
    /// A `capacity` of zero is treated as one.
    #[must_use]
    pub fn channel(capacity: usize, log: Arc<dyn EventLog>) -> (Self, SearchEventWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, SearchEventWorker { receiver, log })
    }
}

impl SearchEventSink for ChannelSearchEventSink {
    fn emit(&self, event: ActivityEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                debug!(kind = dropped.kind.as_str(), "search event queue full; event dropped");
            }
            Err(TrySendError::Closed(dropped)) => {
                debug!(kind = dropped.kind.as_str(), "search event worker stopped; event dropped");
            }
        }
    }
}

/// Receiving half that appends queued events to the event log.
pub struct SearchEventWorker {
    receiver: Receiver<ActivityEvent>,
    log: Arc<dyn EventLog>,
}

impl SearchEventWorker {
    /// Drain events until every sender has been dropped.
    ///
    /// Write failures are logged and the event is discarded.
    pub async fn run(mut self) {
        while let Some(event) = self.receiver.recv().await {
            if let Err(error) = self.log.record_event(event).await {
                warn!(%error, "failed to persist search event");
            }
        }
        debug!("search event worker finished");
    }
}

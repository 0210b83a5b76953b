//! Driven port for emit-and-forget search logging.
//!
//! Emitting never blocks and never fails from the caller's point of view:
//! adapters queue the event and drop it when they cannot, so logging can
//! never change a discovery response.

use crate::domain::ActivityEvent;

/// Fire-and-forget sink for search events.
#[cfg_attr(test, mockall::automock)]
pub trait SearchEventSink: Send + Sync {
    /// Queue `event` for asynchronous persistence.
    fn emit(&self, event: ActivityEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureSearchEventSink;

impl SearchEventSink for FixtureSearchEventSink {
    fn emit(&self, _event: ActivityEvent) {}
}

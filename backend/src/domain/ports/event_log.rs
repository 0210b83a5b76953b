//! Driven port for the activity event log.

use async_trait::async_trait;

use crate::domain::{ActivityEvent, EventBucket, EventCountQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event log adapters.
    pub enum EventLogError {
        /// The log could not be reached. Retryable.
        Connection { message: String } => "event log connection failed: {message}",
        /// The aggregation failed to execute.
        Query { message: String } => "event log query failed: {message}",
        /// The event could not be appended.
        Write { message: String } => "event log write failed: {message}",
    }
}

/// Append and aggregate activity events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Group events selected by `query` into unordered buckets.
    async fn count_events(&self, query: &EventCountQuery)
    -> Result<Vec<EventBucket>, EventLogError>;

    /// Append one event.
    async fn record_event(&self, event: ActivityEvent) -> Result<(), EventLogError>;
}

/// Fixture log that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEventLog;

#[async_trait]
impl EventLog for FixtureEventLog {
    async fn count_events(
        &self,
        _query: &EventCountQuery,
    ) -> Result<Vec<EventBucket>, EventLogError> {
        Ok(Vec::new())
    }

    async fn record_event(&self, _event: ActivityEvent) -> Result<(), EventLogError> {
        Ok(())
    }
}

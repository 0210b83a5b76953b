//! In-memory activity event log.

use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{EventLog, EventLogError};
use crate::domain::{ActivityEvent, EventBucket, EventCountQuery, group_events};

use super::fixtures::{FixtureLoadError, load_json_array};

/// Append-only event log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<ActivityEvent>>,
}

impl InMemoryEventLog {
    /// Log seeded with `events`.
    #[must_use]
    pub const fn new(events: Vec<ActivityEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }

    /// Log seeded from a JSON array of activity events.
    ///
    /// # Errors
    /// Propagates [`FixtureLoadError`] when the file is unreadable or invalid.
    pub fn from_fixture(path: &Path) -> Result<Self, FixtureLoadError> {
        Ok(Self::new(load_json_array(path)?))
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn count_events(
        &self,
        query: &EventCountQuery,
    ) -> Result<Vec<EventBucket>, EventLogError> {
        let events = self
            .events
            .read()
            .map_err(|_| EventLogError::connection("event log lock poisoned"))?;
        Ok(group_events(events.iter(), query))
    }

    async fn record_event(&self, event: ActivityEvent) -> Result<(), EventLogError> {
        self.events
            .write()
            .map_err(|_| EventLogError::write("event log lock poisoned"))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_fixtures::{MINSK, epoch};
    use crate::domain::{EventGrouping, EventKind, GeoFilter, TimeWindow};
    use chrono::Duration;
    use rstest::rstest;

    fn search(category: &str, hours_ago: i64) -> ActivityEvent {
        ActivityEvent {
            kind: EventKind::Search,
            category_id: Some(category.to_owned()),
            location: MINSK,
            occurred_at: epoch() - Duration::hours(hours_ago),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn recorded_events_are_counted_within_the_window() {
        let log = InMemoryEventLog::new(vec![search("bikes", 30)]);
        log.record_event(search("bikes", 1)).await.expect("record");
        log.record_event(search("bikes", 2)).await.expect("record");
        log.record_event(search("sofas", 3)).await.expect("record");

        let query = EventCountQuery {
            kind: EventKind::Search,
            geo: GeoFilter::Radius {
                center: MINSK,
                radius_km: 10.0,
            },
            window: TimeWindow::ending_at(epoch(), 24),
            group_by: EventGrouping::Category,
        };
        let mut buckets = log.count_events(&query).await.expect("count");
        buckets.sort_by(|a, b| a.key.cmp(&b.key));

        let counts: Vec<(&str, u64)> = buckets.iter().map(|b| (b.key.as_str(), b.count)).collect();
        assert_eq!(counts, vec![("bikes", 2), ("sofas", 1)]);
        assert_eq!(
            buckets.first().map(|b| b.last_seen_at),
            Some(epoch() - Duration::hours(1))
        );
    }
}

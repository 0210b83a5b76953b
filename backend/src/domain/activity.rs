//! Activity events and the grouping primitive used by trend aggregation.
//!
//! The event log stores buyer searches (demand), newly published approved
//! listings (supply) and buyer-to-seller contacts. Contacts are kept for
//! completeness of the stream but no trend signal counts them. Trend queries
//! select a kind, a time window and a geographic scope, then group what
//! remains into [`EventBucket`]s.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::geo::{GeoPoint, distance_km, encode_geohash};

/// Kind of activity recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A buyer ran a discovery search.
    Search,
    /// A listing was published and approved.
    ListingPublished,
    /// A buyer contacted the seller of a listing.
    Contact,
}

impl EventKind {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::ListingPublished => "listing_published",
            Self::Contact => "contact",
        }
    }
}

/// A single activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// What happened.
    pub kind: EventKind,
    /// Category searched for or published into, when known.
    #[serde(default)]
    pub category_id: Option<String>,
    /// Where it happened.
    pub location: GeoPoint,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// Closed time interval ending at the query instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hours: u32,
}

impl TimeWindow {
    /// Window covering the `hours` preceding `end`.
    #[must_use]
    pub fn ending_at(end: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: end - Duration::hours(i64::from(hours)),
            end,
            hours,
        }
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Window length in hours.
    #[must_use]
    pub const fn hours(&self) -> u32 {
        self.hours
    }

    /// Whether `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Geographic scope of a trend query.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFilter {
    /// Events within `radius_km` of `center`.
    Radius {
        /// Query centre.
        center: GeoPoint,
        /// Inclusive radius.
        radius_km: f64,
    },
    /// Events whose geohash starts with the prefix, e.g. a country scope.
    GeohashPrefix(String),
}

impl GeoFilter {
    /// Whether `point` lies inside the scope. Non-finite points never match.
    #[must_use]
    pub fn matches(&self, point: GeoPoint) -> bool {
        match self {
            Self::Radius { center, radius_km } => {
                distance_km(*center, point).is_some_and(|km| km <= *radius_km)
            }
            Self::GeohashPrefix(prefix) => encode_geohash(point, prefix.len())
                .is_some_and(|hash| hash.eq_ignore_ascii_case(prefix)),
        }
    }
}

/// How matching events are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventGrouping {
    /// By geohash cell of the given precision.
    Geohash {
        /// Geohash length.
        precision: usize,
    },
    /// By category identifier; events without a category are skipped.
    Category,
}

impl EventGrouping {
    /// Grouping key for `event`, if it has one.
    #[must_use]
    pub fn key_for(&self, event: &ActivityEvent) -> Option<String> {
        match self {
            Self::Geohash { precision } => encode_geohash(event.location, *precision),
            Self::Category => event.category_id.clone(),
        }
    }
}

/// Count of events sharing a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBucket {
    /// Geohash or category identifier.
    pub key: String,
    /// Number of events in the bucket.
    pub count: u64,
    /// Most recent event in the bucket.
    pub last_seen_at: DateTime<Utc>,
}

/// Selection applied to the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCountQuery {
    /// Event kind to count.
    pub kind: EventKind,
    /// Geographic scope.
    pub geo: GeoFilter,
    /// Time window.
    pub window: TimeWindow,
    /// Bucketing strategy.
    pub group_by: EventGrouping,
}

impl EventCountQuery {
    /// Whether `event` is selected by this query.
    #[must_use]
    pub fn selects(&self, event: &ActivityEvent) -> bool {
        event.kind == self.kind
            && self.window.contains(event.occurred_at)
            && self.geo.matches(event.location)
    }
}

/// Group the events selected by `query` into unordered buckets.
///
/// Event log adapters without a native aggregation pipeline use this to
/// satisfy the count contract in process.
pub fn group_events<'a, I>(events: I, query: &EventCountQuery) -> Vec<EventBucket>
where
    I: IntoIterator<Item = &'a ActivityEvent>,
{
    let mut buckets: HashMap<String, EventBucket> = HashMap::new();
    for event in events.into_iter().filter(|event| query.selects(event)) {
        let Some(key) = query.group_by.key_for(event) else {
            continue;
        };
        buckets
            .entry(key)
            .and_modify(|bucket| {
                bucket.count = bucket.count.saturating_add(1);
                bucket.last_seen_at = bucket.last_seen_at.max(event.occurred_at);
            })
            .or_insert_with_key(|key| EventBucket {
                key: key.clone(),
                count: 1,
                last_seen_at: event.occurred_at,
            });
    }
    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    //! Window, scope and grouping behaviour.
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn event(kind: EventKind, category: Option<&str>, at: DateTime<Utc>) -> ActivityEvent {
        ActivityEvent {
            kind,
            category_id: category.map(str::to_owned),
            location: GeoPoint::new(53.9, 27.5667),
            occurred_at: at,
        }
    }

    fn query(now: DateTime<Utc>, group_by: EventGrouping) -> EventCountQuery {
        EventCountQuery {
            kind: EventKind::Search,
            geo: GeoFilter::Radius {
                center: GeoPoint::new(53.9, 27.5667),
                radius_km: 10.0,
            },
            window: TimeWindow::ending_at(now, 24),
            group_by,
        }
    }

    #[rstest]
    fn window_is_inclusive(now: DateTime<Utc>) {
        let window = TimeWindow::ending_at(now, 24);
        assert!(window.contains(now));
        assert!(window.contains(now - Duration::hours(24)));
        assert!(!window.contains(now - Duration::hours(25)));
        assert!(!window.contains(now + Duration::seconds(1)));
    }

    #[rstest]
    #[case("u9ed", true)]
    #[case("U9ED", true)]
    #[case("u9ee", false)]
    fn geohash_prefix_scope(#[case] prefix: &str, #[case] expected: bool) {
        let filter = GeoFilter::GeohashPrefix(prefix.to_owned());
        assert_eq!(filter.matches(GeoPoint::new(53.9, 27.5667)), expected);
    }

    #[rstest]
    fn radius_scope_excludes_non_finite_points() {
        let filter = GeoFilter::Radius {
            center: GeoPoint::new(0.0, 0.0),
            radius_km: 20_000.0,
        };
        assert!(!filter.matches(GeoPoint::new(f64::NAN, 0.0)));
    }

    #[rstest]
    fn groups_by_category_and_tracks_latest(now: DateTime<Utc>) {
        let events = vec![
            event(EventKind::Search, Some("bikes"), now - Duration::hours(3)),
            event(EventKind::Search, Some("bikes"), now - Duration::hours(1)),
            event(EventKind::Search, Some("sofas"), now - Duration::hours(2)),
            event(EventKind::Search, None, now),
            event(EventKind::ListingPublished, Some("bikes"), now),
            event(EventKind::Search, Some("bikes"), now - Duration::hours(30)),
        ];
        let mut buckets = group_events(&events, &query(now, EventGrouping::Category));
        buckets.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(
            buckets,
            vec![
                EventBucket {
                    key: "bikes".to_owned(),
                    count: 2,
                    last_seen_at: now - Duration::hours(1),
                },
                EventBucket {
                    key: "sofas".to_owned(),
                    count: 1,
                    last_seen_at: now - Duration::hours(2),
                },
            ]
        );
    }

    #[rstest]
    fn contacts_are_never_counted_as_demand(now: DateTime<Utc>) {
        let events = vec![
            event(EventKind::Contact, Some("bikes"), now),
            event(EventKind::Contact, Some("bikes"), now - Duration::hours(1)),
            event(EventKind::Search, Some("sofas"), now),
        ];
        let buckets = group_events(&events, &query(now, EventGrouping::Category));
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["sofas"]);
    }

    #[rstest]
    fn contact_events_parse_from_the_log_format() {
        let parsed: ActivityEvent = serde_json::from_value(serde_json::json!({
            "kind": "contact",
            "location": { "lat": 53.9, "lng": 27.5667 },
            "occurredAt": "2026-03-01T11:00:00Z"
        }))
        .expect("contact event");
        assert_eq!(parsed.kind, EventKind::Contact);
        assert_eq!(parsed.kind.as_str(), "contact");
    }

    #[rstest]
    fn groups_by_geohash_cell(now: DateTime<Utc>) {
        let events = vec![event(EventKind::Search, None, now)];
        let buckets = group_events(&events, &query(now, EventGrouping::Geohash { precision: 5 }));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets.first().map(|b| b.key.as_str()), Some("u9ede"));
    }
}

//! Demand, supply and opportunity ranking over grouped activity.
//!
//! Every signal comes from the same primitive: group events by key, count,
//! sort, limit. Demand counts searches, supply counts newly published
//! listings, and opportunity divides the two per key with a finite ceiling.
#![expect(
    clippy::float_arithmetic,
    reason = "opportunity scores are demand/supply ratios"
)]

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::activity::{EventBucket, EventGrouping};

/// Score given to keys with demand but no supply.
pub const DEFAULT_OPPORTUNITY_CEILING: f64 = 1000.0;

/// Trend signal family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendKind {
    /// Buyer searches.
    Demand,
    /// Newly published listings.
    Supply,
    /// Demand relative to supply.
    Opportunity,
}

impl TrendKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Demand => "demand",
            Self::Supply => "supply",
            Self::Opportunity => "opportunity",
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown [`TrendKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trend kind '{0}'")]
pub struct UnknownTrendKind(String);

impl FromStr for TrendKind {
    type Err = UnknownTrendKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demand" => Ok(Self::Demand),
            "supply" => Ok(Self::Supply),
            "opportunity" => Ok(Self::Opportunity),
            other => Err(UnknownTrendKind(other.to_owned())),
        }
    }
}

/// A ranked, derived trend entry. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSignal {
    /// Signal family.
    pub kind: TrendKind,
    /// Display label: the geohash cell or category id.
    pub label: String,
    /// Event count, or demand/supply ratio for opportunity.
    pub score: f64,
    /// Geohash cell when grouped geographically.
    pub geohash: Option<String>,
    /// Category when grouped by category.
    pub category_id: Option<String>,
    /// Window the signal was computed over.
    pub window_hours: u32,
    /// Most recent contributing event.
    pub last_seen_at: DateTime<Utc>,
}

/// Shape shared by every ranking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingSpec {
    /// How buckets were keyed.
    pub grouping: EventGrouping,
    /// Window length reported on each signal.
    pub window_hours: u32,
    /// Maximum number of signals.
    pub limit: usize,
}

impl RankingSpec {
    fn signal(&self, kind: TrendKind, key: String, score: f64, last_seen_at: DateTime<Utc>) -> TrendSignal {
        let (geohash, category_id) = match self.grouping {
            EventGrouping::Geohash { .. } => (Some(key.clone()), None),
            EventGrouping::Category => (None, Some(key.clone())),
        };
        TrendSignal {
            kind,
            label: key,
            score,
            geohash,
            category_id,
            window_hours: self.window_hours,
            last_seen_at,
        }
    }
}

/// Event count as a score without lossy casts.
#[must_use]
pub fn count_score(count: u64) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// Demand over supply, bounded to `[0, ceiling]`.
///
/// Zero demand scores `0.0`; zero supply with demand scores `ceiling`. A
/// non-finite or non-positive ceiling falls back to
/// [`DEFAULT_OPPORTUNITY_CEILING`]. The result is always finite.
///
/// # Examples
/// ```
/// use discovery::domain::opportunity_score;
///
/// assert_eq!(opportunity_score(0, 3, 1000.0), 0.0);
/// assert_eq!(opportunity_score(4, 0, 1000.0), 1000.0);
/// assert_eq!(opportunity_score(6, 3, 1000.0), 2.0);
/// ```
#[must_use]
pub fn opportunity_score(demand: u64, supply: u64, ceiling: f64) -> f64 {
    let cap = if ceiling.is_finite() && ceiling > 0.0 {
        ceiling
    } else {
        DEFAULT_OPPORTUNITY_CEILING
    };
    if demand == 0 {
        return 0.0;
    }
    if supply == 0 {
        return cap;
    }
    (count_score(demand) / count_score(supply)).min(cap)
}

/// Score desc, then most recent desc, then label asc.
fn signal_order(a: &TrendSignal, b: &TrendSignal) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.last_seen_at.cmp(&a.last_seen_at))
        .then_with(|| a.label.cmp(&b.label))
}

fn sort_and_limit(mut signals: Vec<TrendSignal>, limit: usize) -> Vec<TrendSignal> {
    signals.sort_by(signal_order);
    signals.truncate(limit);
    signals
}

/// Rank demand or supply buckets by count.
#[must_use]
pub fn rank_counts(kind: TrendKind, buckets: Vec<EventBucket>, spec: RankingSpec) -> Vec<TrendSignal> {
    let signals = buckets
        .into_iter()
        .map(|bucket| spec.signal(kind, bucket.key, count_score(bucket.count), bucket.last_seen_at))
        .collect();
    sort_and_limit(signals, spec.limit)
}

/// Rank every key seen in either demand or supply by opportunity score.
#[must_use]
pub fn rank_opportunity(
    demand: Vec<EventBucket>,
    supply: Vec<EventBucket>,
    ceiling: f64,
    spec: RankingSpec,
) -> Vec<TrendSignal> {
    #[derive(Default)]
    struct Tally {
        demand: u64,
        supply: u64,
        last_seen_at: Option<DateTime<Utc>>,
    }

    let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
    for (bucket, is_demand) in demand
        .into_iter()
        .map(|b| (b, true))
        .chain(supply.into_iter().map(|b| (b, false)))
    {
        let tally = tallies.entry(bucket.key).or_default();
        if is_demand {
            tally.demand = tally.demand.saturating_add(bucket.count);
        } else {
            tally.supply = tally.supply.saturating_add(bucket.count);
        }
        tally.last_seen_at = tally.last_seen_at.max(Some(bucket.last_seen_at));
    }

    let signals = tallies
        .into_iter()
        .filter_map(|(key, tally)| {
            let last_seen_at = tally.last_seen_at?;
            let score = opportunity_score(tally.demand, tally.supply, ceiling);
            Some(spec.signal(TrendKind::Opportunity, key, score, last_seen_at))
        })
        .collect();
    sort_and_limit(signals, spec.limit)
}

//! Inclusion predicates over enriched records.
//!
//! Every bound is an `Option`: `None` means no constraint, `Some(0)` is a real
//! threshold. Set bounds combine with AND. Contradictory bounds (min > max) are
//! applied as given and simply match nothing.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Result, ScoreError},
    types::EnrichedRecord,
};

/// A publish-date bound: an absolute instant or a number of days before now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBound {
    At(DateTime<Utc>),
    DaysAgo(u32),
}

impl DateBound {
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateBound::At(ts) => *ts,
            DateBound::DaysAgo(days) => now
                .checked_sub_days(Days::new(u64::from(*days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl FromStr for DateBound {
    type Err = ScoreError;

    /// Accepts RFC 3339 (`2024-05-01T10:00:00Z`), a plain date (`2024-05-01`,
    /// midnight UTC) or a day offset (`7d`).
    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
            return Ok(DateBound::At(ts.with_timezone(&Utc)));
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Ok(DateBound::At(date.and_time(NaiveTime::MIN).and_utc()));
        }
        if let Some(days) = parse_day_offset(input) {
            return Ok(DateBound::DaysAgo(days));
        }
        Err(ScoreError::InvalidDateRange {
            input: input.to_string(),
            reason: "expected RFC 3339 timestamp, YYYY-MM-DD or <N>d".to_string(),
        })
    }
}

fn parse_day_offset(input: &str) -> Option<u32> {
    input
        .strip_suffix('d')
        .or_else(|| input.strip_suffix(" days"))
        .and_then(|n| n.trim().parse::<u32>().ok())
}

/// Symbolic publish windows, resolved against the evaluation-time date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Yesterday,
    LastDays(u32),
}

impl DateRange {
    pub const LAST_WEEK: DateRange = DateRange::LastDays(7);
    pub const LAST_MONTH: DateRange = DateRange::LastDays(30);

    /// Inclusive `(after, before)` bounds for this window.
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start_of_today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            DateRange::Today => (start_of_today, now),
            DateRange::Yesterday => (
                start_of_today - TimeDelta::days(1),
                start_of_today - TimeDelta::nanoseconds(1),
            ),
            DateRange::LastDays(days) => (DateBound::DaysAgo(*days).resolve(now), now),
        }
    }
}

impl FromStr for DateRange {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim().to_lowercase();
        match input.as_str() {
            "today" => Ok(DateRange::Today),
            "yesterday" => Ok(DateRange::Yesterday),
            "week" | "last_week" | "last-week" | "last 7 days" => Ok(DateRange::LAST_WEEK),
            "month" | "last_month" | "last-month" | "last 30 days" => Ok(DateRange::LAST_MONTH),
            other => {
                let days = other
                    .strip_prefix("last ")
                    .unwrap_or(other)
                    .trim()
                    .to_string();
                parse_day_offset(&days)
                    .map(DateRange::LastDays)
                    .ok_or_else(|| ScoreError::InvalidDateRange {
                        input: s.to_string(),
                        reason: "expected today, yesterday, week, month or <N>d".to_string(),
                    })
            }
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::Today => write!(f, "today"),
            DateRange::Yesterday => write!(f, "yesterday"),
            DateRange::LastDays(days) => write!(f, "last {} days", days),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub min_duration: Option<u64>,
    pub max_duration: Option<u64>,
    pub min_subscribers: Option<u64>,
    pub max_subscribers: Option<u64>,
    pub min_views: Option<u64>,
    pub max_views: Option<u64>,
    /// Lower bound on the engagement rate percentage.
    pub min_engagement: Option<f64>,
    pub published_after: Option<DateBound>,
    pub published_before: Option<DateBound>,
    /// Symbolic window, intersected with `published_after`/`published_before`.
    pub published_within: Option<DateRange>,
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject criteria that cannot be evaluated at all.
    pub fn validate(&self) -> Result<()> {
        match self.min_engagement {
            Some(min) if !min.is_finite() => Err(ScoreError::InvalidCriteria {
                field: "min_engagement",
                reason: format!("must be a finite number, got {}", min),
            }),
            _ => Ok(()),
        }
    }

    /// Turn relative and symbolic bounds into concrete instants.
    pub fn resolve(&self, now: DateTime<Utc>) -> ResolvedCriteria<'_> {
        let mut after = self.published_after.map(|b| b.resolve(now));
        let mut before = self.published_before.map(|b| b.resolve(now));

        if let Some(range) = self.published_within {
            let (range_after, range_before) = range.resolve(now);
            after = Some(after.map_or(range_after, |a| a.max(range_after)));
            before = Some(before.map_or(range_before, |b| b.min(range_before)));
        }

        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        ResolvedCriteria {
            criteria: self,
            published_after: after,
            published_before: before,
            keyword,
        }
    }
}

/// Criteria with dates pinned to one evaluation instant.
#[derive(Debug, Clone)]
pub struct ResolvedCriteria<'a> {
    criteria: &'a FilterCriteria,
    published_after: Option<DateTime<Utc>>,
    published_before: Option<DateTime<Utc>>,
    keyword: Option<String>,
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
}

impl ResolvedCriteria<'_> {
    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        let c = self.criteria;
        let video = &record.video;

        within(video.duration_seconds, c.min_duration, c.max_duration)
            && within(record.subscriber_count, c.min_subscribers, c.max_subscribers)
            && within(video.view_count, c.min_views, c.max_views)
            && c.min_engagement
                .is_none_or(|min| record.engagement_rate() >= min)
            && within(video.published_at, self.published_after, self.published_before)
            && self.matches_keyword(record)
    }

    fn matches_keyword(&self, record: &EnrichedRecord) -> bool {
        let Some(keyword) = &self.keyword else {
            return true;
        };
        let video = &record.video;
        [
            Some(video.title.as_str()),
            Some(video.description.as_str()),
            video.search_keyword.as_deref(),
            Some(video.channel_title.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(keyword.as_str()))
    }
}

/// Whether `record` passes `criteria`, with dates resolved at `now`.
pub fn matches_at(record: &EnrichedRecord, criteria: &FilterCriteria, now: DateTime<Utc>) -> bool {
    criteria.resolve(now).matches(record)
}

/// Whether `record` passes `criteria`, with dates resolved at the current time.
pub fn matches(record: &EnrichedRecord, criteria: &FilterCriteria) -> bool {
    matches_at(record, criteria, Utc::now())
}

/// Keep the records that pass, preserving order.
pub fn apply_filter(
    records: Vec<EnrichedRecord>,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<EnrichedRecord> {
    let resolved = criteria.resolve(now);
    let before = records.len();
    let kept: Vec<EnrichedRecord> = records.into_iter().filter(|r| resolved.matches(r)).collect();
    debug!(before, after = kept.len(), "applied filter criteria");
    kept
}

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::{
    error::Result,
    filter::{FilterCriteria, apply_filter},
    join::{ChannelLookup, SearchBatch, join_records, merge_batches},
    raw::{RawChannel, RawVideo},
    trends::{TrendReport, analyze_trends, normalized_engagement},
    types::EnrichedRecord,
};

/// Sort by engagement score, highest first. Equal scores keep input order.
pub fn rank_by_engagement(records: &mut [EnrichedRecord]) {
    records.sort_by(|a, b| b.engagement_score.total_cmp(&a.engagement_score));
}

/// Join, filter and rank keyword-tagged batches, evaluated at `now`.
#[instrument(skip_all, fields(batches = batches.len()))]
pub fn score_batches_at(
    batches: Vec<SearchBatch>,
    raw_channels: &[RawChannel],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Result<Vec<EnrichedRecord>> {
    criteria.validate()?;

    let channels = ChannelLookup::from_raw(raw_channels);
    let joined = join_records(merge_batches(batches), &channels, now);
    let mut records = apply_filter(joined, criteria, now);
    rank_by_engagement(&mut records);

    debug!(records = records.len(), "scored search results");
    Ok(records)
}

/// Join, filter and rank one batch of raw videos, evaluated at `now`.
pub fn search_and_score_at(
    raw_videos: Vec<RawVideo>,
    raw_channels: &[RawChannel],
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Result<Vec<EnrichedRecord>> {
    score_batches_at(
        vec![SearchBatch::untagged(raw_videos)],
        raw_channels,
        criteria,
        now,
    )
}

/// Join, filter and rank one batch of raw videos against the current time.
pub fn search_and_score(
    raw_videos: Vec<RawVideo>,
    raw_channels: &[RawChannel],
    criteria: &FilterCriteria,
) -> Result<Vec<EnrichedRecord>> {
    search_and_score_at(raw_videos, raw_channels, criteria, Utc::now())
}

/// Scored results together with their trend report.
///
/// `normalized_engagement[i]` is the min-max normalised score of `videos[i]`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchOutcome {
    pub videos: Vec<EnrichedRecord>,
    pub normalized_engagement: Vec<f64>,
    pub analysis: TrendReport,
}

impl SearchOutcome {
    pub fn from_records(videos: Vec<EnrichedRecord>) -> Self {
        let analysis = analyze_trends(&videos);
        let normalized_engagement = normalized_engagement(&videos);
        Self {
            videos,
            normalized_engagement,
            analysis,
        }
    }

    /// Keep the first `limit` videos. The analysis still covers the full set.
    pub fn truncate(&mut self, limit: usize) {
        self.videos.truncate(limit);
        self.normalized_engagement.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawVideoSnippet, RawVideoStatistics};
    use chrono::TimeZone;

    fn video(id: &str, views: u64) -> RawVideo {
        RawVideo {
            id: id.to_string(),
            snippet: RawVideoSnippet {
                title: Some(format!("video {id}")),
                channel_id: Some("UC1".to_string()),
                published_at: Some("2024-06-14T12:00:00Z".to_string()),
                ..Default::default()
            },
            statistics: RawVideoStatistics {
                view_count: Some(views),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let records = search_and_score_at(
            vec![video("a", 10), video("b", 50), video("c", 10), video("d", 50)],
            &[],
            &FilterCriteria::new(),
            now,
        )
        .unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_invalid_criteria_is_an_error() {
        let criteria = FilterCriteria {
            min_engagement: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(search_and_score(vec![video("a", 1)], &[], &criteria).is_err());
    }

    #[test]
    fn test_outcome_bundles_analysis() {
        let outcome = SearchOutcome::from_records(Vec::new());
        assert!(outcome.videos.is_empty());
        assert!(outcome.normalized_engagement.is_empty());
        assert_eq!(outcome.analysis.record_count, 0);
    }

    #[test]
    fn test_outcome_normalizes_and_truncates() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let records = search_and_score_at(
            vec![video("a", 10), video("b", 50), video("c", 30)],
            &[],
            &FilterCriteria::new(),
            now,
        )
        .unwrap();

        let mut outcome = SearchOutcome::from_records(records);
        assert_eq!(outcome.normalized_engagement, vec![1.0, 0.5, 0.0]);

        outcome.truncate(2);
        assert_eq!(outcome.videos.len(), 2);
        assert_eq!(outcome.normalized_engagement, vec![1.0, 0.5]);
        assert_eq!(outcome.analysis.record_count, 3);
    }
}

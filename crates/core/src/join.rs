//! Joins raw video payloads with channel statistics.
//!
//! Missing data never drops a record: absent counts become 0, an unknown
//! channel gets 0 subscribers, a bad duration token becomes 0 seconds.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    duration::parse_duration,
    engagement::{EngagementInputs, engagement_score},
    raw::{RawChannel, RawVideo},
    types::{ChannelMetrics, EnrichedRecord, VideoRecord},
};

/// Raw videos returned by one search, tagged with the keyword that found them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBatch {
    pub keyword: Option<String>,
    pub videos: Vec<RawVideo>,
}

impl SearchBatch {
    pub fn new(keyword: impl Into<String>, videos: Vec<RawVideo>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            videos,
        }
    }

    pub fn untagged(videos: Vec<RawVideo>) -> Self {
        Self {
            keyword: None,
            videos,
        }
    }
}

/// A raw video plus the keyword of the batch it came from.
#[derive(Debug, Clone)]
pub struct TaggedVideo {
    pub keyword: Option<String>,
    pub video: RawVideo,
}

/// Channel statistics keyed by channel id.
#[derive(Debug, Clone, Default)]
pub struct ChannelLookup {
    channels: HashMap<String, ChannelMetrics>,
}

impl ChannelLookup {
    pub fn from_raw(channels: &[RawChannel]) -> Self {
        let mut lookup = HashMap::with_capacity(channels.len());
        for channel in channels {
            if channel.id.is_empty() {
                continue;
            }
            // first entry for an id wins, same as video dedup
            lookup
                .entry(channel.id.clone())
                .or_insert_with(|| ChannelMetrics {
                    channel_id: channel.id.clone(),
                    title: channel.snippet.title.clone(),
                    subscriber_count: channel.statistics.subscriber_count.unwrap_or(0),
                });
        }
        Self { channels: lookup }
    }

    pub fn get(&self, channel_id: &str) -> Option<&ChannelMetrics> {
        self.channels.get(channel_id)
    }

    pub fn subscriber_count(&self, channel_id: &str) -> u64 {
        self.get(channel_id).map(|c| c.subscriber_count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Drop later occurrences of the same id, keeping input order.
///
/// Items without an id are never treated as duplicates of each other.
pub fn dedup_by_id<T, F>(items: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        let key = id(&item);
        if key.is_empty() || seen.insert(key.to_string()) {
            unique.push(item);
        }
    }
    unique
}

/// Flatten search batches in order, keeping the first copy of each video id.
pub fn merge_batches<I>(batches: I) -> Vec<TaggedVideo>
where
    I: IntoIterator<Item = SearchBatch>,
{
    let tagged: Vec<TaggedVideo> = batches
        .into_iter()
        .flat_map(|batch| {
            let keyword = batch.keyword;
            batch.videos.into_iter().map(move |video| TaggedVideo {
                keyword: keyword.clone(),
                video,
            })
        })
        .collect();

    let total = tagged.len();
    let unique = dedup_by_id(tagged, |t| t.video.id.as_str());
    debug!(total, unique = unique.len(), "merged search batches");
    unique
}

/// Channel ids referenced by the videos, unique, in first-seen order.
pub fn channel_ids<'a, I>(videos: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a RawVideo>,
{
    let mut seen = HashSet::new();
    videos
        .into_iter()
        .filter_map(|v| v.snippet.channel_id.as_deref())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn parse_published_at(video_id: &str, value: Option<&str>) -> DateTime<Utc> {
    match value.map(DateTime::parse_from_rfc3339) {
        Some(Ok(ts)) => ts.with_timezone(&Utc),
        Some(Err(e)) => {
            warn!(video_id, error = %e, "unparseable publish timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }
        None => {
            warn!(video_id, "missing publish timestamp, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// Flatten one raw video into a record. Absent fields take their defaults.
pub fn to_video_record(
    video: &RawVideo,
    search_keyword: Option<&str>,
    channels: &ChannelLookup,
) -> VideoRecord {
    let snippet = &video.snippet;
    let stats = &video.statistics;
    let channel_id = snippet.channel_id.clone().unwrap_or_default();

    let channel_title = snippet
        .channel_title
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| channels.get(&channel_id).and_then(|c| c.title.clone()))
        .unwrap_or_default();

    VideoRecord {
        id: video.id.clone(),
        title: snippet.title.clone().unwrap_or_default(),
        description: snippet.description.clone().unwrap_or_default(),
        channel_id,
        channel_title,
        published_at: parse_published_at(&video.id, snippet.published_at.as_deref()),
        duration_seconds: video
            .content_details
            .duration
            .as_deref()
            .map(parse_duration)
            .unwrap_or(0),
        view_count: stats.view_count.unwrap_or(0),
        like_count: stats.like_count.unwrap_or(0),
        comment_count: stats.comment_count.unwrap_or(0),
        thumbnail_url: snippet.thumbnails.best_url().map(str::to_string),
        search_keyword: search_keyword.map(str::to_string),
    }
}

/// Attach subscriber count and engagement score to a record.
pub fn enrich(video: VideoRecord, channels: &ChannelLookup, now: DateTime<Utc>) -> EnrichedRecord {
    let subscriber_count = channels.subscriber_count(&video.channel_id);
    let engagement_score = engagement_score(
        &EngagementInputs {
            views: video.view_count,
            likes: video.like_count,
            comments: video.comment_count,
            subscriber_count,
            published_at: video.published_at,
        },
        now,
    );

    EnrichedRecord {
        video,
        subscriber_count,
        engagement_score,
    }
}

/// Join tagged videos with channel statistics, one record per unique video id.
pub fn join_records(
    videos: Vec<TaggedVideo>,
    channels: &ChannelLookup,
    now: DateTime<Utc>,
) -> Vec<EnrichedRecord> {
    let videos = dedup_by_id(videos, |t| t.video.id.as_str());
    let mut missing_channels = 0usize;

    let records: Vec<EnrichedRecord> = videos
        .iter()
        .map(|tagged| {
            let record = to_video_record(&tagged.video, tagged.keyword.as_deref(), channels);
            if channels.get(&record.channel_id).is_none() {
                missing_channels += 1;
            }
            enrich(record, channels, now)
        })
        .collect();

    if missing_channels > 0 {
        debug!(
            missing_channels,
            "videos without channel statistics defaulted to 0 subscribers"
        );
    }
    debug!(records = records.len(), "joined video records");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{
        RawChannelSnippet, RawChannelStatistics, RawContentDetails, RawVideoSnippet,
        RawVideoStatistics,
    };
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn raw_video(id: &str, channel_id: &str, title: &str) -> RawVideo {
        RawVideo {
            id: id.to_string(),
            snippet: RawVideoSnippet {
                title: Some(title.to_string()),
                channel_id: Some(channel_id.to_string()),
                published_at: Some("2024-06-10T08:00:00Z".to_string()),
                ..Default::default()
            },
            content_details: RawContentDetails {
                duration: Some("PT3M".to_string()),
            },
            statistics: RawVideoStatistics {
                view_count: Some(100),
                like_count: None,
                comment_count: Some(4),
            },
        }
    }

    fn raw_channel(id: &str, title: &str, subs: Option<u64>) -> RawChannel {
        RawChannel {
            id: id.to_string(),
            snippet: RawChannelSnippet {
                title: Some(title.to_string()),
            },
            statistics: RawChannelStatistics {
                subscriber_count: subs,
                hidden_subscriber_count: false,
            },
        }
    }

    #[test]
    fn test_join_defaults_missing_channel_to_zero() {
        let channels = ChannelLookup::from_raw(&[raw_channel("UC1", "One", Some(250))]);
        let videos = merge_batches([SearchBatch::untagged(vec![
            raw_video("v1", "UC1", "first"),
            raw_video("v2", "UC404", "orphan"),
        ])]);

        let records = join_records(videos, &channels, now());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].subscriber_count, 250);
        assert_eq!(records[1].subscriber_count, 0);
        assert!(records[1].engagement_score.is_finite());
    }

    #[test]
    fn test_join_applies_field_defaults() {
        let channels = ChannelLookup::from_raw(&[raw_channel("UC1", "Channel One", None)]);
        let records = join_records(
            merge_batches([SearchBatch::new("rust", vec![raw_video("v1", "UC1", "t")])]),
            &channels,
            now(),
        );

        let record = &records[0];
        assert_eq!(record.subscriber_count, 0);
        assert_eq!(record.video.like_count, 0);
        assert_eq!(record.video.comment_count, 4);
        assert_eq!(record.video.duration_seconds, 180);
        assert_eq!(record.video.channel_title, "Channel One");
        assert_eq!(record.video.search_keyword.as_deref(), Some("rust"));
        assert!(record.video.thumbnail_url.is_none());
    }

    #[test]
    fn test_bad_timestamp_and_duration_do_not_drop_record() {
        let mut video = raw_video("v1", "UC1", "t");
        video.snippet.published_at = Some("last tuesday".to_string());
        video.content_details.duration = Some("3 minutes".to_string());

        let records = join_records(
            merge_batches([SearchBatch::untagged(vec![video])]),
            &ChannelLookup::default(),
            now(),
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video.published_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(records[0].video.duration_seconds, 0);
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let merged = merge_batches([
            SearchBatch::new("rust", vec![raw_video("v1", "UC1", "from rust")]),
            SearchBatch::new(
                "tokio",
                vec![
                    raw_video("v2", "UC1", "only tokio"),
                    raw_video("v1", "UC1", "from tokio"),
                ],
            ),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].video.id, "v1");
        assert_eq!(merged[0].keyword.as_deref(), Some("rust"));
        assert_eq!(merged[0].video.snippet.title.as_deref(), Some("from rust"));
        assert_eq!(merged[1].video.id, "v2");
    }

    #[test]
    fn test_videos_without_id_are_all_kept() {
        let merged = merge_batches([SearchBatch::untagged(vec![
            raw_video("", "UC1", "first without id"),
            raw_video("", "UC1", "second without id"),
            raw_video("v1", "UC1", "normal"),
            raw_video("v1", "UC1", "normal again"),
        ])]);
        let records = join_records(merged, &ChannelLookup::default(), now());

        let titles: Vec<&str> = records.iter().map(|r| r.title()).collect();
        assert_eq!(titles, vec!["first without id", "second without id", "normal"]);
    }

    #[test]
    fn test_channel_ids_first_seen_order() {
        let videos = vec![
            raw_video("v1", "UC2", "a"),
            raw_video("v2", "UC1", "b"),
            raw_video("v3", "UC2", "c"),
        ];
        assert_eq!(channel_ids(&videos), vec!["UC2", "UC1"]);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    duration::{format_duration, is_short},
    engagement::engagement_rate,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub thumbnail_url: Option<String>,
    /// Search keyword whose results produced this video, if known.
    pub search_keyword: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel_id: String,
    pub title: Option<String>,
    pub subscriber_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub video: VideoRecord,
    pub subscriber_count: u64,
    pub engagement_score: f64,
}

impl EnrichedRecord {
    pub fn id(&self) -> &str {
        &self.video.id
    }

    pub fn title(&self) -> &str {
        &self.video.title
    }

    pub fn channel_title(&self) -> &str {
        &self.video.channel_title
    }

    /// Plain `(likes + comments) / views * 100` percentage.
    pub fn engagement_rate(&self) -> f64 {
        engagement_rate(
            self.video.view_count,
            self.video.like_count,
            self.video.comment_count,
        )
    }

    pub fn is_short(&self) -> bool {
        is_short(self.video.duration_seconds)
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.video.duration_seconds)
    }
}

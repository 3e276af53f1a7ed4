//! Tubescore Core Library
//!
//! Normalizes raw video search payloads, joins them with channel statistics,
//! filters and ranks them by a weighted engagement score, and summarizes the
//! result set into trend insights.

pub mod cache;
pub mod duration;
pub mod engagement;
pub mod error;
pub mod filter;
pub mod format;
pub mod join;
pub mod pipeline;
pub mod raw;
pub mod session;
pub mod source;
pub mod trends;
pub mod types;

// Re-export commonly used items at crate root
pub use duration::{format_duration, format_duration_token, is_short, parse_duration};
pub use engagement::{EngagementInputs, engagement_rate, engagement_score};
pub use error::{Result, ScoreError};
pub use filter::{DateBound, DateRange, FilterCriteria, apply_filter, matches, matches_at};
pub use format::{format_count, format_ranked_table, format_report_readable};
pub use join::{ChannelLookup, SearchBatch, join_records, merge_batches};
pub use pipeline::{
    SearchOutcome, rank_by_engagement, score_batches_at, search_and_score, search_and_score_at,
};
pub use raw::{RawChannel, RawVideo, parse_channels_response, parse_videos_response};
pub use session::{SearchQuery, SearchSession};
pub use source::{StaticSource, VideoSource};
pub use trends::{Finding, TopVideo, TrendReport, analyze_trends};
pub use types::{ChannelMetrics, EnrichedRecord, VideoRecord};

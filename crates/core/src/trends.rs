//! Trend aggregation over a scored result set.
//!
//! Each insight has a minimum sample size. Below it the insight reports
//! insufficient data; an empty result set reports no data for every field.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::LazyLock,
};

use chrono::Timelike;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::EnrichedRecord;

pub const MIN_RECORDS_FOR_DURATION: usize = 3;
pub const MIN_RECORDS_FOR_PUBLISH_HOUR: usize = 5;
pub const TOP_KEYWORDS: usize = 10;
/// Title tokens of this many characters or fewer are ignored.
pub const MAX_IGNORED_TOKEN_LEN: usize = 3;

static WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word regex is valid"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "this", "that", "with", "from", "what", "when", "where", "which", "your", "about",
        "after", "again", "also", "been", "before", "being", "between", "both", "could", "does",
        "doing", "down", "each", "have", "having", "here", "into", "just", "more", "most",
        "only", "other", "over", "same", "should", "some", "such", "than", "them", "then",
        "there", "these", "they", "those", "through", "under", "until", "very", "were", "while",
        "whom", "will", "would", "their", "theirs", "yours", "ours",
    ]
    .into_iter()
    .collect()
});

/// Upper bounds (inclusive, seconds) of the duration buckets.
const DURATION_BUCKETS: [(u64, &str); 7] = [
    (60, "<1min"),
    (300, "1-5min"),
    (600, "5-10min"),
    (1200, "10-20min"),
    (1800, "20-30min"),
    (3600, "30-60min"),
    (u64::MAX, ">60min"),
];

/// Outcome of one aggregate insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Finding<T> {
    Found(T),
    InsufficientData,
    NoData,
}

impl<T> Finding<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Finding::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Finding::Found(_))
    }
}

impl<T: fmt::Display> fmt::Display for Finding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Found(value) => fmt::Display::fmt(value, f),
            Finding::InsufficientData => write!(f, "insufficient data"),
            Finding::NoData => write!(f, "no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopVideo {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub engagement_score: f64,
}

impl fmt::Display for TopVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" by {}", self.title, self.channel_title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub record_count: usize,
    pub optimal_duration: Finding<String>,
    pub trend_keywords: Vec<String>,
    pub best_publish_time: Finding<String>,
    pub top_video: Finding<TopVideo>,
}

impl TrendReport {
    pub fn no_data() -> Self {
        Self {
            record_count: 0,
            optimal_duration: Finding::NoData,
            trend_keywords: Vec::new(),
            best_publish_time: Finding::NoData,
            top_video: Finding::NoData,
        }
    }

    /// Short prose summary of the report.
    pub fn performance_insights(&self) -> String {
        if self.record_count == 0 {
            return "No videos to analyze.".to_string();
        }

        let mut lines = Vec::with_capacity(3);
        if let Finding::Found(bucket) = &self.optimal_duration {
            lines.push(format!(
                "Top performing videos in this category tend to be {} in length.",
                bucket
            ));
        }
        if let Finding::Found(top) = &self.top_video {
            lines.push(format!("The highest engagement is for {}.", top));
        }
        if let Finding::Found(hour) = &self.best_publish_time {
            lines.push(format!(
                "Videos uploaded around {} tend to perform better.",
                hour
            ));
        }
        if lines.is_empty() {
            return "Not enough videos for reliable insights.".to_string();
        }
        lines.join("\n")
    }
}

/// Index into the duration buckets for a video length.
fn bucket_index(seconds: u64) -> usize {
    DURATION_BUCKETS
        .iter()
        .position(|(upper, _)| seconds <= *upper)
        .unwrap_or(DURATION_BUCKETS.len() - 1)
}

fn bucket_label(index: usize) -> &'static str {
    DURATION_BUCKETS[index].1
}

/// Render an hour of day (0-23) as `12 AM`, `1 PM` and so on.
pub fn format_hour(hour: u32) -> String {
    let hour = hour % 24;
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}", display, suffix)
}

/// Running mean per group, remembering the order groups first appear in.
struct GroupedMean<K> {
    order: Vec<K>,
    sums: HashMap<K, (f64, usize)>,
}

impl<K: Copy + Eq + std::hash::Hash> GroupedMean<K> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            sums: HashMap::new(),
        }
    }

    fn record(&mut self, key: K, value: f64) {
        let entry = self.sums.entry(key).or_insert_with(|| {
            self.order.push(key);
            (0.0, 0)
        });
        entry.0 += value;
        entry.1 += 1;
    }

    /// Group with the highest mean; ties go to `rank(key)`-smallest group.
    fn best_by<R: Ord>(&self, rank: impl Fn(&K) -> R) -> Option<K> {
        let mut best: Option<(K, f64)> = None;
        let mut keys = self.order.clone();
        keys.sort_by_key(|k| rank(k));

        for key in keys {
            let (sum, count) = self.sums[&key];
            let mean = sum / count as f64;
            match best {
                Some((_, best_mean)) if mean <= best_mean => {}
                _ => best = Some((key, mean)),
            }
        }
        best.map(|(key, _)| key)
    }
}

/// Bucket with the highest mean engagement score.
pub fn optimal_duration(records: &[EnrichedRecord]) -> Finding<String> {
    if records.is_empty() {
        return Finding::NoData;
    }
    if records.len() < MIN_RECORDS_FOR_DURATION {
        return Finding::InsufficientData;
    }

    let mut groups = GroupedMean::new();
    for record in records {
        groups.record(bucket_index(record.video.duration_seconds), record.engagement_score);
    }

    match groups.best_by(|bucket| *bucket) {
        Some(bucket) => Finding::Found(bucket_label(bucket).to_string()),
        None => Finding::NoData,
    }
}

/// Lowercased title words, minus stop words and short tokens.
pub fn title_tokens(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    WORD_REGEX
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|word| word.chars().count() > MAX_IGNORED_TOKEN_LEN)
        .filter(|word| !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// Most frequent title words, ties broken by first appearance.
pub fn trending_keywords(records: &[EnrichedRecord], limit: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records {
        for word in title_tokens(&record.video.title) {
            match counts.get_mut(&word) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(word.clone(), 1);
                    order.push(word);
                }
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order
}

/// Hour of day (UTC) with the highest mean engagement score.
pub fn best_publish_hour(records: &[EnrichedRecord]) -> Finding<u32> {
    if records.is_empty() {
        return Finding::NoData;
    }
    if records.len() < MIN_RECORDS_FOR_PUBLISH_HOUR {
        return Finding::InsufficientData;
    }

    let mut groups = GroupedMean::new();
    for record in records {
        groups.record(record.video.published_at.hour(), record.engagement_score);
    }

    match groups.best_by(|hour| *hour) {
        Some(hour) => Finding::Found(hour),
        None => Finding::NoData,
    }
}

/// Highest scoring record; the earliest one wins a tie.
pub fn top_record(records: &[EnrichedRecord]) -> Option<&EnrichedRecord> {
    records.iter().fold(None, |best, record| match best {
        Some(current) if record.engagement_score <= current.engagement_score => Some(current),
        _ => Some(record),
    })
}

/// Min-max normalised scores in input order; a single value (or all equal) maps to 1.0.
pub fn normalized_engagement(records: &[EnrichedRecord]) -> Vec<f64> {
    let scores = records.iter().map(|r| r.engagement_score);
    let min = scores.clone().fold(f64::INFINITY, f64::min);
    let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    scores
        .map(|score| if span > 0.0 { (score - min) / span } else { 1.0 })
        .collect()
}

pub fn analyze_trends(records: &[EnrichedRecord]) -> TrendReport {
    if records.is_empty() {
        debug!("trend analysis over empty result set");
        return TrendReport::no_data();
    }

    let top_video = match top_record(records) {
        Some(record) => Finding::Found(TopVideo {
            id: record.video.id.clone(),
            title: record.video.title.clone(),
            channel_title: record.video.channel_title.clone(),
            engagement_score: record.engagement_score,
        }),
        None => Finding::NoData,
    };

    let report = TrendReport {
        record_count: records.len(),
        optimal_duration: optimal_duration(records),
        trend_keywords: trending_keywords(records, TOP_KEYWORDS),
        best_publish_time: match best_publish_hour(records) {
            Finding::Found(hour) => Finding::Found(format_hour(hour)),
            Finding::InsufficientData => Finding::InsufficientData,
            Finding::NoData => Finding::NoData,
        },
        top_video,
    };

    debug!(
        records = report.record_count,
        keywords = report.trend_keywords.len(),
        "analyzed trends"
    );
    report
}

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tubescore_core::{RawChannel, RawVideo, parse_channels_response};

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Raw video item in `videos.list` shape, counts encoded as strings.
pub fn video(
    id: &str,
    title: &str,
    channel_id: &str,
    published_at: &str,
    duration: &str,
    (views, likes, comments): (u64, u64, u64),
) -> RawVideo {
    let json = format!(
        r#"{{
            "id": "{id}",
            "snippet": {{
                "title": "{title}",
                "description": "",
                "channelId": "{channel_id}",
                "channelTitle": "Channel {channel_id}",
                "publishedAt": "{published_at}"
            }},
            "contentDetails": {{ "duration": "{duration}" }},
            "statistics": {{
                "viewCount": "{views}",
                "likeCount": "{likes}",
                "commentCount": "{comments}"
            }}
        }}"#
    );
    serde_json::from_str(&json).unwrap()
}

pub fn channels(entries: &[(&str, u64)]) -> Vec<RawChannel> {
    let items: Vec<String> = entries
        .iter()
        .map(|(id, subs)| {
            format!(r#"{{"id":"{id}","statistics":{{"subscriberCount":"{subs}"}}}}"#)
        })
        .collect();
    parse_channels_response(&format!(r#"{{"items":[{}]}}"#, items.join(","))).unwrap()
}

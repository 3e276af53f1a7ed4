//! Raw payloads as delivered by the data source.
//!
//! These mirror the item shapes of the `videos.list` and `channels.list`
//! responses. Every field the pipeline reads is optional here; the joiner
//! decides the defaults.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: RawVideoSnippet,
    #[serde(default)]
    pub content_details: RawContentDetails,
    #[serde(default)]
    pub statistics: RawVideoStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideoSnippet {
    pub title: Option<String>,
    pub description: Option<String>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    #[serde(default)]
    pub thumbnails: RawThumbnails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThumbnails {
    pub default: Option<RawThumbnail>,
    pub medium: Option<RawThumbnail>,
    pub high: Option<RawThumbnail>,
}

impl RawThumbnails {
    /// Best available thumbnail, preferring the high resolution variant.
    pub fn best_url(&self) -> Option<&str> {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|thumb| thumb.url.as_str())
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawContentDetails {
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideoStatistics {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub view_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub like_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub comment_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: RawChannelSnippet,
    #[serde(default)]
    pub statistics: RawChannelStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChannelSnippet {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannelStatistics {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

/// Counts arrive as decimal strings (`"1234"`), occasionally as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum CountField {
    Number(u64),
    Float(f64),
    Text(String),
}

/// Unparseable counts become `None` instead of failing the whole payload.
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<CountField>::deserialize(deserializer).unwrap_or(None);
    Ok(field.and_then(|value| match value {
        CountField::Number(n) => Some(n),
        CountField::Float(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
        CountField::Float(_) => None,
        CountField::Text(s) => s.trim().parse::<u64>().ok(),
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload<T> {
    Response { items: Vec<T> },
    Items(Vec<T>),
}

impl<T> ListPayload<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Response { items } => items,
            ListPayload::Items(items) => items,
        }
    }
}

/// Decode a `videos.list` response body, or a bare array of its items.
pub fn parse_videos_response(json: &str) -> Result<Vec<RawVideo>> {
    let payload: ListPayload<RawVideo> = serde_json::from_str(json)?;
    Ok(payload.into_items())
}

/// Decode a `channels.list` response body, or a bare array of its items.
pub fn parse_channels_response(json: &str) -> Result<Vec<RawChannel>> {
    let payload: ListPayload<RawChannel> = serde_json::from_str(json)?;
    Ok(payload.into_items())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_videos_response_envelope() {
        let json = r#"{
            "kind": "youtube#videoListResponse",
            "items": [{
                "id": "abc123",
                "snippet": {
                    "title": "Rust in 100 seconds",
                    "description": "fast intro",
                    "channelId": "UC1",
                    "channelTitle": "Fireship",
                    "publishedAt": "2024-03-01T15:30:00Z",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/d.jpg" },
                        "high": { "url": "https://i.ytimg.com/h.jpg" }
                    }
                },
                "contentDetails": { "duration": "PT2M10S" },
                "statistics": { "viewCount": "1500", "likeCount": "120" }
            }]
        }"#;

        let videos = parse_videos_response(json).unwrap();
        assert_eq!(videos.len(), 1);
        let video = &videos[0];
        assert_eq!(video.id, "abc123");
        assert_eq!(video.snippet.channel_id.as_deref(), Some("UC1"));
        assert_eq!(video.content_details.duration.as_deref(), Some("PT2M10S"));
        assert_eq!(video.statistics.view_count, Some(1500));
        assert_eq!(video.statistics.like_count, Some(120));
        assert_eq!(video.statistics.comment_count, None);
        assert_eq!(
            video.snippet.thumbnails.best_url(),
            Some("https://i.ytimg.com/h.jpg")
        );
    }

    #[test]
    fn test_parse_bare_array_and_lenient_counts() {
        let json = r#"[
            { "id": "a", "statistics": { "viewCount": 42, "likeCount": "n/a" } },
            { "id": "b" }
        ]"#;

        let videos = parse_videos_response(json).unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].statistics.view_count, Some(42));
        assert_eq!(videos[0].statistics.like_count, None);
        assert_eq!(videos[1].statistics.view_count, None);
        assert!(videos[1].snippet.title.is_none());
    }

    #[test]
    fn test_parse_channels_response() {
        let json = r#"{ "items": [
            { "id": "UC1", "snippet": { "title": "One" }, "statistics": { "subscriberCount": "1000" } },
            { "id": "UC2", "statistics": { "hiddenSubscriberCount": true } }
        ] }"#;

        let channels = parse_channels_response(json).unwrap();
        assert_eq!(channels[0].statistics.subscriber_count, Some(1000));
        assert_eq!(channels[1].statistics.subscriber_count, None);
        assert!(channels[1].statistics.hidden_subscriber_count);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_videos_response("not json").is_err());
    }
}

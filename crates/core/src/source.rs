use crate::{
    error::Result,
    join::SearchBatch,
    raw::{RawChannel, RawVideo},
};

/// Where raw search results come from: an API client, a recorded fixture, a
/// test double. The pipeline only ever sees what these methods return.
pub trait VideoSource {
    fn name(&self) -> &str;

    /// Videos matching `keyword`, at most `max_results` of them.
    fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<RawVideo>>;

    /// Statistics for the given channel ids. Unknown ids may simply be absent.
    fn channels(&self, channel_ids: &[String]) -> Result<Vec<RawChannel>>;

    fn search_batch(&self, keyword: &str, max_results: usize) -> Result<SearchBatch> {
        Ok(SearchBatch::new(keyword, self.search(keyword, max_results)?))
    }
}

/// In-memory source over already-fetched payloads.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    batches: Vec<SearchBatch>,
    channels: Vec<RawChannel>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_batch(mut self, batch: SearchBatch) -> Self {
        self.batches.push(batch);
        self
    }

    pub fn with_channels(mut self, channels: Vec<RawChannel>) -> Self {
        self.channels.extend(channels);
        self
    }
}

impl VideoSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn search(&self, keyword: &str, max_results: usize) -> Result<Vec<RawVideo>> {
        let needle = keyword.trim().to_lowercase();
        Ok(self
            .batches
            .iter()
            .filter(|b| {
                b.keyword
                    .as_deref()
                    .is_some_and(|k| k.trim().to_lowercase() == needle)
            })
            .flat_map(|b| b.videos.iter().cloned())
            .take(max_results)
            .collect())
    }

    fn channels(&self, channel_ids: &[String]) -> Result<Vec<RawChannel>> {
        Ok(self
            .channels
            .iter()
            .filter(|c| channel_ids.contains(&c.id))
            .cloned()
            .collect())
    }
}

//! Caller-owned search session.
//!
//! A session owns the memoization cache so nothing is shared between
//! independent callers. Identical queries within one session are served from
//! the cache until it is cleared.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::{
    cache::{ResultCache, cache_key, key_digest},
    error::{Result, ScoreError},
    filter::FilterCriteria,
    join::{SearchBatch, channel_ids},
    pipeline::score_batches_at,
    source::VideoSource,
    types::EnrichedRecord,
};

pub const DEFAULT_MAX_RESULTS: usize = 50;

fn source_failure(source_name: &str, err: ScoreError) -> ScoreError {
    match err {
        ScoreError::SourceFailed { .. } => err,
        other => ScoreError::SourceFailed {
            source_name: source_name.to_string(),
            reason: other.to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub max_results: usize,
    #[serde(default)]
    pub criteria: FilterCriteria,
}

impl SearchQuery {
    pub fn new(keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            max_results: DEFAULT_MAX_RESULTS,
            criteria: FilterCriteria::default(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ScoreError::InvalidQuery {
                reason: "at least one non-empty keyword is required".to_string(),
            });
        }
        if self.max_results == 0 {
            return Err(ScoreError::InvalidQuery {
                reason: "max_results must be greater than zero".to_string(),
            });
        }
        self.criteria.validate()
    }
}

/// Results depend on both the query and where it was run.
fn search_key<S: VideoSource + ?Sized>(source: &S, query: &SearchQuery) -> Result<String> {
    cache_key(&(source.name(), query))
}

#[derive(Debug)]
pub struct SearchSession {
    id: Uuid,
    cache: ResultCache,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cache: ResultCache::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Drop the cached result of one query against `source`. Returns whether
    /// anything was cached.
    pub fn invalidate<S: VideoSource + ?Sized>(
        &mut self,
        source: &S,
        query: &SearchQuery,
    ) -> Result<bool> {
        Ok(self.cache.remove(&search_key(source, query)?))
    }

    pub fn search<S: VideoSource + ?Sized>(
        &mut self,
        source: &S,
        query: &SearchQuery,
    ) -> Result<Arc<[EnrichedRecord]>> {
        self.search_at(source, query, Utc::now())
    }

    /// Run `query` against `source`, scoring at `now`, or return the cached result.
    pub fn search_at<S: VideoSource + ?Sized>(
        &mut self,
        source: &S,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Result<Arc<[EnrichedRecord]>> {
        query.validate()?;
        let span = info_span!("search", session = %self.id, source = source.name());
        let _guard = span.enter();

        let key = search_key(source, query)?;
        let digest = key_digest(&key);
        if let Some(cached) = self.cache.get(&key) {
            info!(key = digest, records = cached.len(), "serving cached search results");
            return Ok(cached);
        }

        let mut batches: Vec<SearchBatch> = Vec::with_capacity(query.keywords.len());
        for keyword in query.keywords.iter().filter(|k| !k.trim().is_empty()) {
            let batch = source
                .search_batch(keyword, query.max_results)
                .map_err(|e| source_failure(source.name(), e))?;
            debug!(keyword = keyword.as_str(), videos = batch.videos.len(), "fetched batch");
            batches.push(batch);
        }

        let ids = channel_ids(batches.iter().flat_map(|b| b.videos.iter()));
        let channels = if ids.is_empty() {
            Vec::new()
        } else {
            source
                .channels(&ids)
                .map_err(|e| source_failure(source.name(), e))?
        };
        debug!(requested = ids.len(), received = channels.len(), "fetched channels");

        let records = score_batches_at(batches, &channels, &query.criteria, now)?;
        info!(key = digest, records = records.len(), "search complete");
        Ok(self.cache.insert(key, records))
    }
}

use crate::catalog::{Bucket, Catalog};
use crate::error::Result;
use crate::models::{Feed, FeedRequest, VideoId, VideoSummary};
use crate::services::cache::CacheStore;
use crate::services::youtube_service::VideoSource;
use crate::services::{paginator, rotation};
use crate::utils::normalize_query;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Candidates gathered per pinned slot before the daily shuffle.
pub const PINNED_CANDIDATE_FACTOR: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub search_ttl: Duration,
    pub feed_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(30 * 60),
            feed_ttl: Duration::from_secs(6 * 60 * 60),
        }
    }
}

enum Plan<'a> {
    Search(String),
    Bucket(&'a Bucket),
}

impl Plan<'_> {
    fn cache_key(&self, limit: usize, day: NaiveDate) -> String {
        match self {
            Plan::Search(query) => format!("search|{query}|{limit}"),
            Plan::Bucket(bucket) if bucket.rotates_daily() => {
                format!("bucket|{}|{limit}|{}", bucket.name, day.format("%Y-%m-%d"))
            }
            Plan::Bucket(bucket) => format!("bucket|{}|{limit}", bucket.name),
        }
    }

    fn ttl(&self, policy: &CachePolicy) -> Duration {
        match self {
            Plan::Search(_) => policy.search_ttl,
            Plan::Bucket(_) => policy.feed_ttl,
        }
    }
}

/// Turns a feed request into a deduplicated, enriched and cached list of videos.
pub struct AggregationEngine {
    source: Arc<dyn VideoSource>,
    cache: Arc<dyn CacheStore>,
    catalog: Catalog,
    policy: CachePolicy,
}

impl AggregationEngine {
    pub fn new(
        source: Arc<dyn VideoSource>,
        cache: Arc<dyn CacheStore>,
        catalog: Catalog,
        policy: CachePolicy,
    ) -> Self {
        Self {
            source,
            cache,
            catalog,
            policy,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn plan(&self, request: &FeedRequest) -> Option<Plan<'_>> {
        match request {
            FeedRequest::Search { query, .. } => {
                let query = normalize_query(query);
                (!query.is_empty()).then_some(Plan::Search(query))
            }
            FeedRequest::ByBucket { bucket, .. } => self.catalog.resolve(bucket).map(Plan::Bucket),
        }
    }

    /// Cache key for `request` on `day`, or `None` when the request can never
    /// produce items (blank query, unknown bucket without fallback).
    pub fn cache_key(&self, request: &FeedRequest, day: NaiveDate) -> Option<String> {
        self.plan(request)
            .map(|plan| plan.cache_key(request.limit(), day))
    }

    pub async fn resolve(&self, request: &FeedRequest) -> Result<Feed> {
        self.resolve_on(request, Utc::now().date_naive()).await
    }

    /// Resolves `request` as of the UTC calendar `day`.
    pub async fn resolve_on(&self, request: &FeedRequest, day: NaiveDate) -> Result<Feed> {
        let limit = request.limit();
        let Some(plan) = self.plan(request) else {
            return Ok(Feed::empty());
        };
        if limit == 0 {
            return Ok(Feed::empty());
        }
        let key = plan.cache_key(limit, day);

        if let Some(payload) = self.cache.get(&key) {
            match serde_json::from_str::<Vec<VideoSummary>>(&payload) {
                Ok(items) => {
                    info!("Serving from cache: {key}");
                    return Ok(Feed {
                        items,
                        cached: true,
                    });
                }
                Err(e) => warn!("Ignoring unreadable cache entry {key}: {e}"),
            }
        }

        let ids = match &plan {
            Plan::Search(query) => {
                paginator::collect(self.source.as_ref(), std::slice::from_ref(query), limit).await?
            }
            Plan::Bucket(bucket) => self.collect_bucket(bucket, limit, day).await?,
        };

        if ids.is_empty() {
            info!("No videos found for {key}, skipping cache write");
            return Ok(Feed::empty());
        }

        let details = self.source.batch_details(&ids).await?;
        let items = shape(&ids, details, limit);

        if items.is_empty() {
            info!("No videos resolved for {key}, skipping cache write");
        } else {
            let payload = serde_json::to_string(&items)?;
            self.cache.put(&key, payload, plan.ttl(&self.policy));
            info!("Wrote cache: {key} ({} items)", items.len());
        }

        Ok(Feed {
            items,
            cached: false,
        })
    }

    /// Pinned groups first, each reshuffled for `day`; then the bucket's own
    /// queries fill what is left, never repeating a pinned id.
    async fn collect_bucket(
        &self,
        bucket: &Bucket,
        limit: usize,
        day: NaiveDate,
    ) -> Result<Vec<VideoId>> {
        let mut selected: Vec<VideoId> = Vec::with_capacity(limit);
        let mut taken: HashSet<VideoId> = HashSet::new();

        for group in &bucket.pinned {
            let want = group.target_count.min(limit - selected.len());
            if want == 0 {
                continue;
            }

            let candidates = paginator::collect_excluding(
                self.source.as_ref(),
                &group.effective_queries(),
                want * PINNED_CANDIDATE_FACTOR,
                &taken,
            )
            .await?;
            let picks = rotation::pick_daily(&candidates, &group.name, day, want);
            debug!(
                "pinned '{}' picked {} of {} candidates",
                group.name,
                picks.len(),
                candidates.len()
            );

            for id in picks {
                taken.insert(id.clone());
                selected.push(id);
            }
        }

        let remaining = limit - selected.len();
        if remaining > 0 {
            let fill = paginator::collect_excluding(
                self.source.as_ref(),
                &bucket.queries,
                remaining,
                &taken,
            )
            .await?;
            selected.extend(fill);
        }

        Ok(selected)
    }
}

/// Orders details by collection order and drops ids that did not resolve.
fn shape(ids: &[VideoId], details: Vec<VideoSummary>, limit: usize) -> Vec<VideoSummary> {
    let mut by_id: HashMap<VideoId, VideoSummary> = details
        .into_iter()
        .map(|summary| (summary.id.clone(), summary))
        .collect();

    ids.iter()
        .filter_map(|id| by_id.remove(id))
        .take(limit)
        .collect()
}

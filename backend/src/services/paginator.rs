use crate::error::Result;
use crate::models::VideoId;
use crate::services::youtube_service::{VideoSource, MAX_RESULTS_PER_CALL};
use log::{debug, info};
use std::collections::HashSet;

/// Pages fetched per query before moving on to the next one.
pub const MAX_PAGES_PER_QUERY: usize = 3;

/// Collects up to `target` unique ids from `queries`, in order.
pub async fn collect(
    source: &dyn VideoSource,
    queries: &[String],
    target: usize,
) -> Result<Vec<VideoId>> {
    collect_excluding(source, queries, target, &HashSet::new()).await
}

/// Same as [`collect`], but ids in `exclude` are never returned and do not
/// count towards `target`.
///
/// Page tokens never carry over from one query to the next. A short (or
/// empty) result is returned when every query runs out of pages first.
pub async fn collect_excluding(
    source: &dyn VideoSource,
    queries: &[String],
    target: usize,
    exclude: &HashSet<VideoId>,
) -> Result<Vec<VideoId>> {
    let mut collected: Vec<VideoId> = Vec::with_capacity(target);
    if target == 0 {
        return Ok(collected);
    }

    let mut seen = exclude.clone();

    for query in queries {
        let mut page_token: Option<String> = None;

        for page in 1..=MAX_PAGES_PER_QUERY {
            let result = source
                .search(query, page_token.as_deref(), MAX_RESULTS_PER_CALL)
                .await?;

            for hit in result.items {
                if seen.insert(hit.id.clone()) {
                    collected.push(hit.id);
                    if collected.len() >= target {
                        debug!("reached {target} ids on '{query}' page {page}");
                        return Ok(collected);
                    }
                }
            }

            match result.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
    }

    info!(
        "partial collection: {} of {target} ids from {} queries",
        collected.len(),
        queries.len()
    );
    Ok(collected)
}

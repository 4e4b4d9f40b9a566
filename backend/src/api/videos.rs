use crate::models::{ErrorResponse, FeedRequest, FeedResponse};
use crate::AppState;
use log::error;
use rocket::serde::json::Json;
use rocket::{get, State};

pub const MAX_LIMIT: usize = 50;
pub const DEFAULT_FEED_LIMIT: usize = 24;
pub const DEFAULT_SEARCH_LIMIT: usize = 12;

pub fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

async fn respond(
    state: &State<AppState>,
    request: FeedRequest,
) -> Result<Json<FeedResponse>, ErrorResponse> {
    match state.engine.resolve(&request).await {
        Ok(feed) => Ok(Json(feed.into())),
        Err(e) => {
            error!("Failed to resolve {request:?}: {e}");
            Err(e.into())
        }
    }
}

/// `GET /videos?age=3-5&q=paw%20patrol&limit=24`. A non-blank `q` turns the
/// request into a search.
#[get("/videos?<age>&<q>&<limit>")]
pub async fn list_videos(
    age: Option<String>,
    q: Option<String>,
    limit: Option<usize>,
    state: &State<AppState>,
) -> Result<Json<FeedResponse>, ErrorResponse> {
    let limit = clamp_limit(limit, DEFAULT_FEED_LIMIT);
    let request = match q.filter(|q| !q.trim().is_empty()) {
        Some(query) => FeedRequest::Search { query, limit },
        None => FeedRequest::ByBucket {
            bucket: age.unwrap_or_else(|| "all".to_string()),
            limit,
        },
    };
    respond(state, request).await
}

#[get("/search?<q>&<limit>")]
pub async fn search_videos(
    q: Option<String>,
    limit: Option<usize>,
    state: &State<AppState>,
) -> Result<Json<FeedResponse>, ErrorResponse> {
    let request = FeedRequest::Search {
        query: q.unwrap_or_default(),
        limit: clamp_limit(limit, DEFAULT_SEARCH_LIMIT),
    };
    respond(state, request).await
}

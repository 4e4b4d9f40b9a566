use crate::error::KidVidError;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use std::io::Cursor;

pub type VideoId = String;

/// Fully enriched card data. Only built from the batch-detail call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: VideoId,
    pub title: String,
    pub channel: String,
    pub thumbnail_url: String,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One search result before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: VideoId,
    pub title: String,
    pub channel: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub items: Vec<SearchHit>,
    pub next_page_token: Option<String>,
}

/// What the route layer hands to the engine. `limit` is already clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedRequest {
    ByBucket { bucket: String, limit: usize },
    Search { query: String, limit: usize },
}

impl FeedRequest {
    pub fn limit(&self) -> usize {
        match self {
            FeedRequest::ByBucket { limit, .. } | FeedRequest::Search { limit, .. } => *limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub items: Vec<VideoSummary>,
    pub cached: bool,
}

impl Feed {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            cached: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct FeedResponse {
    pub ok: bool,
    pub cached: bool,
    pub count: usize,
    pub items: Vec<VideoSummary>,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            ok: true,
            cached: feed.cached,
            count: feed.items.len(),
            items: feed.items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub ok: bool,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct IndexResponse {
    pub ok: bool,
    pub service: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct KeyProbe {
    pub key_index: usize,
    pub ok: bool,
    pub status: u16,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct DiagResponse {
    pub ok: bool,
    pub test: String,
    pub results: Vec<KeyProbe>,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub message: String,
    #[serde(skip)]
    pub status: Status,
}

impl From<KidVidError> for ErrorResponse {
    fn from(e: KidVidError) -> Self {
        Self {
            ok: false,
            error: e.kind().to_string(),
            message: e.to_string(),
            status: e.http_status(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

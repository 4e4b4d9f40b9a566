use crate::error::{KidVidError, Result};
use crate::models::{KeyProbe, SearchHit, SearchPage, VideoId, VideoSummary};
use crate::services::credentials::{Credential, CredentialPool};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Upper bound the API accepts for both `maxResults` and the `id` list.
pub const MAX_RESULTS_PER_CALL: usize = 50;

/// The two upstream calls the aggregation engine needs.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search(
        &self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<SearchPage>;

    /// Only ids that still resolve come back; output order is unspecified.
    async fn batch_details(&self, ids: &[VideoId]) -> Result<Vec<VideoSummary>>;
}

/// YouTube Data API v3 client with per-call key failover.
///
/// Documentation: https://developers.google.com/youtube/v3/docs/search/list
/// and https://developers.google.com/youtube/v3/docs/videos/list
pub struct YouTubeClient {
    http: Client,
    base_url: String,
    credentials: Arc<CredentialPool>,
}

impl YouTubeClient {
    pub fn new(
        credentials: Arc<CredentialPool>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    fn endpoint_url(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        credential: &Credential,
    ) -> Result<Url> {
        let mut url = Url::parse_with_params(&format!("{}/{endpoint}", self.base_url), params)
            .map_err(|e| KidVidError::upstream(None, format!("invalid API URL: {e}")))?;
        url.query_pairs_mut().append_pair("key", credential.expose());
        Ok(url)
    }

    async fn send(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        credential: &Credential,
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint, params, credential)?;
        Ok(self.http.get(url).send().await?)
    }

    /// Tries each key at most once, starting from the shared cursor as read
    /// when the call begins. Quota/auth denials rotate to the next key; any
    /// other failure is returned as-is.
    async fn get_with_failover(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        let attempts = self.credentials.len();
        let start = self.credentials.position();

        for attempt in 1..=attempts {
            let position = start + attempt - 1;
            let key_index = self.credentials.index_of(position);
            let response = self
                .send(endpoint, params, self.credentials.at(position))
                .await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.json::<Value>().await?);
            }

            let body = response.text().await.unwrap_or_default();
            if is_quota_denial(status) {
                warn!(
                    "YouTube key #{key_index} denied on /{endpoint} with {status} (attempt {attempt}/{attempts}), rotating"
                );
                self.credentials.advance_past(position);
                continue;
            }

            error!("YouTube /{endpoint} failed with {status} using key #{key_index}");
            return Err(KidVidError::upstream(
                Some(status.as_u16()),
                upstream_message(&body),
            ));
        }

        Err(KidVidError::AllCredentialsExhausted { attempts })
    }

    /// Runs one small search per key, without failover, and reports how each fared.
    pub async fn probe_keys(&self, query: &str, max_results: usize) -> Vec<KeyProbe> {
        let params = search_params(query, None, max_results);
        let mut results = Vec::with_capacity(self.credentials.len());

        for (i, credential) in self.credentials.iter().enumerate() {
            let probe = match self.send("search", &params, credential).await {
                Ok(response) => {
                    let status = response.status();
                    let count = if status.is_success() {
                        response
                            .json::<Value>()
                            .await
                            .map(|json| parse_search_page(&json).items.len())
                            .unwrap_or(0)
                    } else {
                        0
                    };
                    KeyProbe {
                        key_index: i + 1,
                        ok: status.is_success(),
                        status: status.as_u16(),
                        count,
                        error: None,
                    }
                }
                Err(e) => KeyProbe {
                    key_index: i + 1,
                    ok: false,
                    status: 0,
                    count: 0,
                    error: Some(e.to_string()),
                },
            };
            results.push(probe);
        }

        results
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn search(
        &self,
        query: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<SearchPage> {
        let params = search_params(query, page_token, max_results);
        let json = self.get_with_failover("search", &params).await?;
        let page = parse_search_page(&json);
        debug!(
            "search '{query}' (page token {:?}) returned {} items",
            page_token,
            page.items.len()
        );
        Ok(page)
    }

    async fn batch_details(&self, ids: &[VideoId]) -> Result<Vec<VideoSummary>> {
        let mut summaries = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_RESULTS_PER_CALL) {
            let params = vec![
                ("part", "snippet,contentDetails,statistics".to_string()),
                ("id", chunk.join(",")),
                ("maxResults", chunk.len().to_string()),
            ];
            let json = self.get_with_failover("videos", &params).await?;
            if let Some(items) = json["items"].as_array() {
                summaries.extend(items.iter().filter_map(parse_video_summary));
            }
        }

        debug!("details resolved {} of {} ids", summaries.len(), ids.len());
        Ok(summaries)
    }
}

fn search_params(query: &str, page_token: Option<&str>, max_results: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("part", "snippet".to_string()),
        ("q", query.to_string()),
        ("type", "video".to_string()),
        (
            "maxResults",
            max_results.clamp(1, MAX_RESULTS_PER_CALL).to_string(),
        ),
        ("safeSearch", "strict".to_string()),
        ("videoEmbeddable", "true".to_string()),
        ("videoSyndicated", "true".to_string()),
    ];
    if let Some(token) = page_token.filter(|t| !t.is_empty()) {
        params.push(("pageToken", token.to_string()));
    }
    params
}

/// 401/403 mean the key is revoked or out of quota, 429 means it is rate limited.
pub fn is_quota_denial(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    )
}

fn upstream_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn pick_thumbnail(snippet: &Value) -> Option<String> {
    ["medium", "high", "default"]
        .iter()
        .find_map(|size| {
            snippet["thumbnails"][size]["url"]
                .as_str()
                .filter(|url| !url.is_empty())
        })
        .map(String::from)
}

fn parse_search_hit(item: &Value) -> Option<SearchHit> {
    let id = item["id"]["videoId"]
        .as_str()
        .or_else(|| item["id"].as_str())
        .filter(|id| !id.is_empty())?;
    let snippet = &item["snippet"];

    Some(SearchHit {
        id: id.to_string(),
        title: snippet["title"].as_str().unwrap_or("").to_string(),
        channel: snippet["channelTitle"].as_str().unwrap_or("").to_string(),
        thumbnail_url: pick_thumbnail(snippet),
    })
}

pub fn parse_search_page(json: &Value) -> SearchPage {
    SearchPage {
        items: json["items"]
            .as_array()
            .map(|arr| arr.iter().filter_map(parse_search_hit).collect())
            .unwrap_or_default(),
        next_page_token: json["nextPageToken"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map(String::from),
    }
}

/// `None` when the record has no id or no usable thumbnail.
pub fn parse_video_summary(item: &Value) -> Option<VideoSummary> {
    let id = item["id"].as_str().filter(|id| !id.is_empty())?;
    let snippet = &item["snippet"];
    let thumbnail_url = pick_thumbnail(snippet)?;

    Some(VideoSummary {
        id: id.to_string(),
        title: snippet["title"].as_str().unwrap_or("").to_string(),
        channel: snippet["channelTitle"].as_str().unwrap_or("").to_string(),
        thumbnail_url,
        source_url: format!("https://www.youtube.com/watch?v={id}"),
        duration: item["contentDetails"]["duration"]
            .as_str()
            .filter(|d| !d.is_empty())
            .map(String::from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_page_skips_items_without_video_id() {
        let body = json!({
            "nextPageToken": "CAUQAA",
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "v1" },
                  "snippet": { "title": "One", "channelTitle": "Chan",
                               "thumbnails": { "high": { "url": "https://i.ytimg.com/v1/hq.jpg" } } } },
                { "id": { "kind": "youtube#channel", "channelId": "UC123" },
                  "snippet": { "title": "A channel" } }
            ]
        });

        let page = parse_search_page(&body);
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "v1");
        assert_eq!(
            page.items[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/v1/hq.jpg")
        );
    }

    #[test]
    fn empty_next_page_token_means_last_page() {
        let page = parse_search_page(&json!({ "items": [], "nextPageToken": "" }));
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn video_summary_prefers_medium_thumbnail() {
        let item = json!({
            "id": "abc",
            "snippet": {
                "title": "Counting to ten",
                "channelTitle": "Numberblocks",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/abc/default.jpg" },
                    "medium": { "url": "https://i.ytimg.com/abc/mq.jpg" }
                }
            },
            "contentDetails": { "duration": "PT4M13S" },
            "statistics": { "viewCount": "42" }
        });

        let summary = parse_video_summary(&item).unwrap();
        assert_eq!(summary.thumbnail_url, "https://i.ytimg.com/abc/mq.jpg");
        assert_eq!(summary.channel, "Numberblocks");
        assert_eq!(summary.duration.as_deref(), Some("PT4M13S"));
        assert_eq!(summary.source_url, "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn video_without_thumbnail_is_dropped() {
        let item = json!({ "id": "abc", "snippet": { "title": "No art" } });
        assert!(parse_video_summary(&item).is_none());
    }

    #[test]
    fn quota_statuses() {
        assert!(is_quota_denial(StatusCode::FORBIDDEN));
        assert!(is_quota_denial(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_quota_denial(StatusCode::UNAUTHORIZED));
        assert!(!is_quota_denial(StatusCode::BAD_REQUEST));
        assert!(!is_quota_denial(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn upstream_message_reads_google_error_body() {
        let body = r#"{"error":{"code":400,"message":"Invalid pageToken"}}"#;
        assert_eq!(upstream_message(body), "Invalid pageToken");
        assert_eq!(upstream_message("plain text"), "plain text");
    }

    #[test]
    fn search_params_include_page_token_only_when_present() {
        let first = search_params("bluey", None, 80);
        assert!(first.iter().all(|(k, _)| *k != "pageToken"));
        assert!(first.contains(&("maxResults", "50".to_string())));

        let next = search_params("bluey", Some("TOKEN"), 10);
        assert!(next.contains(&("pageToken", "TOKEN".to_string())));
    }
}

//! Scripted in-memory `VideoSource` for unit tests.

use crate::error::{KidVidError, Result};
use crate::models::{SearchHit, SearchPage, VideoId, VideoSummary};
use crate::services::youtube_service::VideoSource;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

enum Scripted {
    Page(SearchPage),
    Fail(u16),
}

type PageKey = (String, Option<String>);

/// Unscripted `(query, token)` pairs answer with an empty last page.
#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<PageKey, Scripted>,
    vanished: HashSet<VideoId>,
    detail_failure: Option<u16>,
    search_log: Mutex<Vec<PageKey>>,
    detail_log: Mutex<Vec<Vec<VideoId>>>,
}

pub fn ids(raw: &[&str]) -> Vec<VideoId> {
    raw.iter().map(|id| id.to_string()).collect()
}

pub fn summary(id: &str) -> VideoSummary {
    VideoSummary {
        id: id.to_string(),
        title: format!("Video {id}"),
        channel: "Kids Channel".to_string(),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg"),
        source_url: format!("https://www.youtube.com/watch?v={id}"),
        duration: Some("PT3M".to_string()),
    }
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, query: &str, token: Option<&str>, hits: &[&str], next: Option<&str>) -> Self {
        let page = SearchPage {
            items: hits
                .iter()
                .map(|id| SearchHit {
                    id: id.to_string(),
                    title: format!("Video {id}"),
                    channel: "Kids Channel".to_string(),
                    thumbnail_url: None,
                })
                .collect(),
            next_page_token: next.map(String::from),
        };
        self.pages.insert(
            (query.to_string(), token.map(String::from)),
            Scripted::Page(page),
        );
        self
    }

    pub fn fail_search(mut self, query: &str, token: Option<&str>, status: u16) -> Self {
        self.pages.insert(
            (query.to_string(), token.map(String::from)),
            Scripted::Fail(status),
        );
        self
    }

    /// These ids show up in search but no longer resolve in the detail call.
    pub fn vanish(mut self, raw: &[&str]) -> Self {
        self.vanished.extend(ids(raw));
        self
    }

    pub fn fail_details(mut self, status: u16) -> Self {
        self.detail_failure = Some(status);
        self
    }

    pub fn search_calls(&self) -> Vec<PageKey> {
        self.search_log.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<Vec<VideoId>> {
        self.detail_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSource for FakeSource {
    async fn search(
        &self,
        query: &str,
        page_token: Option<&str>,
        _max_results: usize,
    ) -> Result<SearchPage> {
        let key = (query.to_string(), page_token.map(String::from));
        self.search_log.lock().unwrap().push(key.clone());

        match self.pages.get(&key) {
            Some(Scripted::Page(page)) => Ok(page.clone()),
            Some(Scripted::Fail(status)) => {
                Err(KidVidError::upstream(Some(*status), "scripted failure"))
            }
            None => Ok(SearchPage::default()),
        }
    }

    async fn batch_details(&self, ids: &[VideoId]) -> Result<Vec<VideoSummary>> {
        self.detail_log.lock().unwrap().push(ids.to_vec());

        if let Some(status) = self.detail_failure {
            return Err(KidVidError::upstream(Some(status), "scripted failure"));
        }

        // Reverse to make sure callers don't rely on upstream ordering.
        Ok(ids
            .iter()
            .rev()
            .filter(|id| !self.vanished.contains(*id))
            .map(|id| summary(id))
            .collect())
    }
}

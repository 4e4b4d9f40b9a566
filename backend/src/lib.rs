#[macro_use]
extern crate rocket;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use rocket::{Build, Rocket};
use services::aggregator::AggregationEngine;
use services::youtube_service::YouTubeClient;
use std::sync::Arc;

pub struct AppState {
    pub engine: Arc<AggregationEngine>,
    pub youtube: Arc<YouTubeClient>,
}

/// Mounts every route on `rocket` and hands it the shared state.
pub fn mount(rocket: Rocket<Build>, state: AppState) -> Rocket<Build> {
    rocket
        .manage(state)
        .mount(
            "/",
            routes![
                api::health::index,
                api::health::health,
                api::health::diag,
                api::videos::list_videos,
                api::videos::search_videos,
            ],
        )
        .mount("/api", routes![api::videos::search_videos])
}

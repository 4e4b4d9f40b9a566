use crate::models::{DiagResponse, HealthResponse, IndexResponse};
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{get, State};

const DIAG_QUERY: &str = "numberblocks";
const DIAG_RESULTS: usize = 3;

const SERVICE_NAME: &str = "kidvid-server";
const ENDPOINTS: &[&str] = &["/health", "/videos", "/search", "/api/search", "/diag"];

#[get("/")]
pub fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

#[get("/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: chrono::Utc::now().to_rfc3339(),
    })
}

/// Probes every configured key once, bypassing failover and the cache.
#[get("/diag")]
pub async fn diag(state: &State<AppState>) -> Json<DiagResponse> {
    let results = state.youtube.probe_keys(DIAG_QUERY, DIAG_RESULTS).await;
    let healthy = results.iter().filter(|probe| probe.ok).count();
    info!("Key diagnostics: {healthy}/{} keys healthy", results.len());

    Json(DiagResponse {
        ok: true,
        test: DIAG_QUERY.to_string(),
        results,
    })
}

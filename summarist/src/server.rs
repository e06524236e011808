use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{get, post, routes, Build, Rocket, State};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use common::ServerConfig;

use crate::service::{SummaryResponse, SummaryService};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub service: Arc<SummaryService>,
}

impl AppState {
    pub fn new(service: Arc<SummaryService>) -> Self {
        Self {
            started_at: Utc::now(),
            service,
        }
    }
}

/// Request body for `/summary`.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub url: String,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    model: String,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning uptime and the configured model.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        model: state.service.model().to_string(),
    })
}

/// Summarize the page or video behind `url`. Domain failures are reported in
/// the body, never through the status code.
#[post("/summary", data = "<body>")]
async fn summary(state: &State<AppState>, body: Json<SummaryRequest>) -> Json<SummaryResponse> {
    let span = tracing::info_span!("summary", request_id = %uuid::Uuid::new_v4());
    Json(state.service.respond(&body.url).instrument(span).await)
}

/// Build the Rocket instance with managed state and routes, bound per `server`.
pub fn build_rocket(state: AppState, server: &ServerConfig) -> Rocket<Build> {
    let fig = rocket::Config::figment()
        .merge(("address", server.bind.clone()))
        .merge(("port", server.port));

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![health, status, summary])
}

/// Launch Rocket - this will run until shutdown (SIGINT/SIGTERM etc.)
pub async fn launch_rocket(state: AppState, server: &ServerConfig) -> Result<()> {
    tracing::info!(bind = %server.bind, port = server.port, "Starting Rocket HTTP server");
    build_rocket(state, server)
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}

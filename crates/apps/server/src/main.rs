use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use feed::{SnapshotArbiter, builtin_sources};
use parking_lot::RwLock;
use playback::{DecayCurve, Engine, VirtualClock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod view;
mod ws;

use config::{ConfigSummary, HostConfig};
use view::{BroadcastSink, ViewUpdate, table_rows, view_stats};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<Engine>>,
    pub summary: Arc<ConfigSummary>,
    pub view_tx: broadcast::Sender<ViewUpdate>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match HostConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let arbiter = match SnapshotArbiter::from_config(&config.feed) {
        Ok(arbiter) => arbiter,
        Err(err) => {
            error!("invalid feed configuration: {err}");
            std::process::exit(1);
        }
    };

    let (view_tx, _) = broadcast::channel(64);

    let mut engine = Engine::new(
        config.filter.clone(),
        VirtualClock::new(config.window, config.speed_hours_per_sec),
        DecayCurve::default_fade(),
    );
    engine.add_sink(Box::new(BroadcastSink::new(view_tx.clone())));
    let engine = Arc::new(RwLock::new(engine));

    // First snapshot before the server starts answering. A failed fetch is
    // already reported; playback simply starts over an empty catalog and the
    // polling task retries.
    if let Ok(events) = arbiter.refresh().await {
        engine.write().replace_events(events);
    }

    if let Some(interval) = arbiter.poll_interval() {
        let engine = engine.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // the first tick fires immediately
            loop {
                ticker.tick().await;
                if let Ok(events) = arbiter.refresh().await {
                    engine.write().replace_events(events);
                }
            }
        });
    }

    // The per-frame tick loop. Real elapsed time is measured so the virtual
    // clock advances correctly even when a tick is delayed.
    {
        let engine = engine.clone();
        let tick_interval = config.tick_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let dt_s = now.duration_since(last).as_secs_f64();
                last = now;
                engine.write().tick(dt_s);
            }
        });
    }

    let addr = config.addr;
    let state = AppState {
        engine,
        summary: Arc::new(config.summary()),
        view_tx,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/config", get(get_config))
        .route("/sources", get(get_sources))
        .route("/view", get(get_view))
        .route("/table", get(get_table))
        .route("/stats", get(get_stats))
        .route("/clock", get(get_clock))
        .route("/play", post(post_play))
        .route("/pause", post(post_pause))
        .route("/rewind", post(post_rewind))
        .route("/ws", get(ws_upgrade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("replay server listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await.unwrap(), app)
        .await
        .unwrap();
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_config(State(state): State<AppState>) -> Json<ConfigSummary> {
    Json(state.summary.as_ref().clone())
}

async fn get_sources() -> Json<Vec<feed::SourceSpec>> {
    Json(builtin_sources())
}

async fn get_view(State(state): State<AppState>) -> Json<ViewUpdate> {
    let engine = state.engine.read();
    let view = engine.view();
    Json(ViewUpdate::build(engine.clock().now_ms(), &view, false))
}

async fn get_table(State(state): State<AppState>) -> Json<Vec<view::TableRow>> {
    let engine = state.engine.read();
    Json(table_rows(&engine.view()))
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    bins: Option<usize>,
}

async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Json<view::ViewStats> {
    let bins = params.bins.unwrap_or(30).clamp(1, 200);
    let engine = state.engine.read();
    Json(view_stats(&engine.view(), bins))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClockStatus {
    clock_ms: i64,
    label: String,
    playing: bool,
    speed_hours_per_sec: f64,
}

fn clock_status(engine: &Engine) -> ClockStatus {
    ClockStatus {
        clock_ms: engine.clock().now_ms(),
        label: engine.clock_label(),
        playing: engine.clock().playing(),
        speed_hours_per_sec: engine.clock().speed_hours_per_sec(),
    }
}

async fn get_clock(State(state): State<AppState>) -> Json<ClockStatus> {
    Json(clock_status(&state.engine.read()))
}

async fn post_play(State(state): State<AppState>) -> Json<ClockStatus> {
    let mut engine = state.engine.write();
    engine.play();
    Json(clock_status(&engine))
}

async fn post_pause(State(state): State<AppState>) -> Json<ClockStatus> {
    let mut engine = state.engine.write();
    engine.pause();
    Json(clock_status(&engine))
}

async fn post_rewind(State(state): State<AppState>) -> Json<ClockStatus> {
    let mut engine = state.engine.write();
    engine.rewind();
    Json(clock_status(&engine))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| ws::handle_socket(socket, state))
}

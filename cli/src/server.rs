// HTTP / WebSocket Boundary
//
// PUT /append            -> {"uid": n}
// GET /notify  (ws)      -> {"message": "new data", "cursor": n} ...
// GET /stream?cursor=n   -> {"record": r} ...
// GET /                  -> health glue

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use tally_kernel::channel::{NotifyChannel, StreamChannel};
use tally_kernel::config::ChannelConfig;
use tally_kernel::log::AppendLog;
use tally_kernel::write::{AppendRequest, AppendResponse, WriteEndpoint};

use crate::error::Result;
use crate::socket::JsonSocket;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    log: Arc<AppendLog>,
    writer: WriteEndpoint,
    channels: ChannelConfig,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(log: Arc<AppendLog>, channels: ChannelConfig, shutdown: CancellationToken) -> Self {
        Self {
            writer: WriteEndpoint::new(log.clone()),
            log,
            channels,
            shutdown,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/append", put(append))
        .route("/notify", get(notify))
        .route("/stream", get(stream))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse { message: "Testing" })
}

async fn append(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AppendRequest>, JsonRejection>,
) -> Result<Json<AppendResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.writer.accept(request)))
}

async fn notify(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let channel = NotifyChannel::connect(state.log.clone(), &state.channels);
        let mut sink = JsonSocket::new(socket);
        channel.run(&mut sink, state.shutdown.child_token()).await;
    })
}

#[derive(Debug, Deserialize)]
struct StreamParams {
    #[serde(default)]
    cursor: u64,
}

async fn stream(
    State(state): State<AppState>,
    params: std::result::Result<Query<StreamParams>, QueryRejection>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response> {
    // The cursor is checked before the upgrade, so a bad cursor is a 400
    // whether or not the request asked for a WebSocket.
    let Query(StreamParams { cursor }) = params?;
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    Ok(ws.on_upgrade(move |socket| async move {
        let channel = StreamChannel::open(state.log.clone(), cursor, &state.channels);
        let mut sink = JsonSocket::new(socket);
        channel.run(&mut sink, state.shutdown.child_token()).await;
    }))
}

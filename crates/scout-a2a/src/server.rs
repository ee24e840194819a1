//! A2A server — agent card discovery plus JSON-RPC task endpoint
//!
//! `GET /.well-known/agent.json` returns the card. `POST /` takes JSON-RPC;
//! streaming methods answer with Server-Sent Events, one JSON-RPC response per
//! event.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures_util::stream;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::protocol::*;
use crate::task_manager::TaskManager;

pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

#[derive(Clone)]
struct AppState {
    card: Arc<AgentCard>,
    manager: Arc<dyn TaskManager>,
}

/// Serves one agent over A2A
pub struct A2aServer {
    card: AgentCard,
    manager: Arc<dyn TaskManager>,
    host: String,
    port: u16,
}

impl A2aServer {
    pub fn new(
        card: AgentCard,
        manager: Arc<dyn TaskManager>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            card,
            manager,
            host: host.into(),
            port,
        }
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            card: Arc::new(self.card.clone()),
            manager: Arc::clone(&self.manager),
        };
        Router::new()
            .route("/", post(process_request))
            .route(AGENT_CARD_PATH, get(agent_card))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and serve until ctrl-c
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind A2A server to {}", addr))?;

        info!("A2A server for '{}' listening on {}", self.card.name, addr);
        info!("Agent card: http://{}{}", addr, AGENT_CARD_PATH);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("A2A server failed")?;

        info!("A2A server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

/// Malformed envelopes are answered with HTTP 400, like the reference server
fn bad_request(id: Value, err: A2aError) -> Response {
    warn!("Rejecting A2A request: {}", err);
    (StatusCode::BAD_REQUEST, Json(JsonRpcResponse::error(id, err))).into_response()
}

fn reply(id: Value, result: Result<impl serde::Serialize, A2aError>) -> Response {
    let response = match result.and_then(|r| {
        serde_json::to_value(r).map_err(|e| A2aError::Internal(e.to_string()))
    }) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => JsonRpcResponse::error(id, err),
    };
    Json(response).into_response()
}

fn params<T: DeserializeOwned>(value: Value) -> Result<T, A2aError> {
    serde_json::from_value(value).map_err(|e| A2aError::InvalidParams(e.to_string()))
}

async fn process_request(State(state): State<AppState>, body: Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return bad_request(Value::Null, A2aError::Parse(e.to_string())),
    };
    let id = raw.get("id").cloned().unwrap_or(Value::Null);

    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(r) => r,
        Err(e) => return bad_request(id, A2aError::InvalidRequest(e.to_string())),
    };
    if request.jsonrpc != "2.0" {
        return bad_request(
            id,
            A2aError::InvalidRequest(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
        );
    }

    debug!("A2A {} (id {})", request.method, id);
    let manager = &state.manager;

    match request.method.as_str() {
        methods::SEND => match params::<TaskSendParams>(request.params) {
            Ok(p) => reply(id, manager.on_send_task(p).await),
            Err(e) => bad_request(id, e),
        },
        methods::SEND_SUBSCRIBE => match params::<TaskSendParams>(request.params) {
            Ok(p) => match manager.on_send_task_subscribe(p).await {
                Ok(events) => event_stream(id, events),
                Err(e) => reply(id, Err::<Value, _>(e)),
            },
            Err(e) => bad_request(id, e),
        },
        methods::GET => match params::<TaskQueryParams>(request.params) {
            Ok(p) => reply(id, manager.on_get_task(p).await),
            Err(e) => bad_request(id, e),
        },
        methods::CANCEL => match params::<TaskIdParams>(request.params) {
            Ok(p) => reply(id, manager.on_cancel_task(p).await),
            Err(e) => bad_request(id, e),
        },
        methods::RESUBSCRIBE => match params::<TaskQueryParams>(request.params) {
            Ok(p) => match manager.on_resubscribe_to_task(p).await {
                Ok(events) => event_stream(id, events),
                Err(e) => reply(id, Err::<Value, _>(e)),
            },
            Err(e) => bad_request(id, e),
        },
        methods::SET_PUSH_NOTIFICATION | methods::GET_PUSH_NOTIFICATION => {
            reply(id, Err::<Value, _>(A2aError::UnsupportedOperation))
        }
        other => reply(id, Err::<Value, _>(A2aError::MethodNotFound(other.to_string()))),
    }
}

/// Wrap task events as SSE, each carried in a JSON-RPC response
fn event_stream(id: Value, events: mpsc::Receiver<TaskEvent>) -> Response {
    let stream = stream::unfold((events, id), |(mut events, id)| async move {
        let event = events.recv().await?;
        let response = JsonRpcResponse::success(
            id.clone(),
            serde_json::to_value(&event).unwrap_or(Value::Null),
        );
        Some((Event::default().json_data(response), (events, id)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

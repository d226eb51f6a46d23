use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arcade_maze_server::constants::TICK_MS;
use arcade_maze_server::engine::{GameEngine, GameEngineOptions};
use arcade_maze_server::high_score_store::HighScoreStore;
use arcade_maze_server::server_utils::{parse_direction, parse_port, parse_seed};
use arcade_maze_server::types::Direction;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct ServerState {
    clients: HashMap<String, mpsc::Sender<String>>,
    game: GameEngine,
    high_scores: HighScoreStore,
    score_recorded: bool,
}

impl ServerState {
    fn new(high_scores: HighScoreStore, seed: u32) -> anyhow::Result<Self> {
        let game = GameEngine::new(GameEngineOptions {
            seed,
            high_score: high_scores.high_score(),
            ..GameEngineOptions::default()
        })
        .context("classic layout failed to load")?;
        Ok(Self {
            clients: HashMap::new(),
            game,
            high_scores,
            score_recorded: false,
        })
    }
}

#[derive(Debug, PartialEq)]
enum ClientMessage {
    Input { dir: Direction },
    Restart,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = parse_port(std::env::var("PORT").ok().as_deref());
    let high_score_path = std::env::var("HIGH_SCORE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/highscore.json"));
    let seed = parse_seed(std::env::var("GAME_SEED").ok().as_deref()).unwrap_or_else(rand::random);

    let state = Arc::new(Mutex::new(ServerState::new(
        HighScoreStore::new(high_score_path),
        seed,
    )?));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/highscore", get(high_score_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; serving API only");
        app
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("failed to bind :{port}"))?;
    info!(port, seed, "listening");
    axum::serve(listener, app)
        .await
        .context("server runtime failed")
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }
    [PathBuf::from("dist/client"), PathBuf::from("public")]
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn high_score_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.high_scores.build_response())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = format!("client_{}", NEXT_ID.fetch_add(1, Ordering::Relaxed));
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        let init = json!({
            "type": "init",
            "board": guard.game.get_board_init(),
            "highScore": guard.high_scores.high_score(),
        });
        let _ = tx.try_send(init.to_string());
        guard.clients.insert(client_id.clone(), tx.clone());
        info!(client = %client_id, clients = guard.clients.len(), "client connected");
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };
        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => continue,
            },
            Message::Close(_) => break,
            _ => continue,
        };
        let Some(parsed) = parse_client_message(&raw) else {
            debug!(client = %client_id, "ignoring invalid message");
            continue;
        };
        let mut guard = state.lock().await;
        apply_client_message(&mut guard, parsed);
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
        info!(client = %client_id, clients = guard.clients.len(), "client disconnected");
    }
    drop(tx);
    let _ = writer.await;
}

fn apply_client_message(state: &mut ServerState, message: ClientMessage) {
    match message {
        ClientMessage::Input { dir } => state.game.set_input(dir),
        ClientMessage::Restart => {
            state.game.reset_game();
            state.score_recorded = false;
            let init = json!({
                "type": "init",
                "board": state.game.get_board_init(),
                "highScore": state.high_scores.high_score(),
            });
            broadcast(state, &init);
            info!("game restarted");
        }
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    state.game.step(TICK_MS);
    let snapshot = state.game.build_snapshot(true);
    broadcast(state, &json!({ "type": "state", "snapshot": snapshot }));

    if state.game.is_ended() && !state.score_recorded {
        state.score_recorded = true;
        let summary = state.game.build_summary();
        if state.high_scores.record(summary.score) {
            info!(score = summary.score, "new high score");
        }
        broadcast(state, &json!({ "type": "game_over", "summary": summary }));
    }
}

/// Slow clients miss frames rather than stall the tick loop.
fn broadcast(state: &ServerState, message: &Value) {
    let payload = message.to_string();
    for (client_id, tx) in &state.clients {
        if tx.try_send(payload.clone()).is_err() {
            debug!(client = %client_id, "dropping frame for slow client");
        }
    }
}

fn parse_client_message(raw: &str) -> Option<ClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    match object.get("type")?.as_str()? {
        "input" => {
            let dir = parse_direction(object.get("dir")?.as_str()?)?;
            Some(ClientMessage::Input { dir })
        }
        "restart" => Some(ClientMessage::Restart),
        _ => None,
    }
}

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use maze_chase_engine::config::EngineConfig;
use maze_chase_engine::constants::{TICK_MS, TICK_SECS};
use maze_chase_engine::engine::GameEngine;
use maze_chase_engine::server_protocol::{parse_client_message, ParsedClientMessage, ServerMessage};
use maze_chase_engine::world::load_level;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Text level file; the built-in classic maze when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// JSON engine config overrides.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for pursuer randomness. Falls back to $SEED, then a random seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

/// One game shared by every connected client.
struct ServerState {
    clients: HashMap<String, ClientContext>,
    engine: GameEngine<StdRng>,
}

impl ServerState {
    fn new(engine: GameEngine<StdRng>) -> Self {
        Self {
            clients: HashMap::new(),
            engine,
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let seed = resolve_seed(cli.seed, std::env::var("SEED").ok().as_deref());

    let config = match cli.config.as_deref() {
        None => EngineConfig::default(),
        Some(path) => match EngineConfig::from_json_file(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                std::process::exit(2);
            }
        },
    };
    let level = load_level(cli.level.as_deref());
    info!(
        "level {}x{} with {} pickups, seed {seed}",
        level.grid.width(),
        level.grid.height(),
        level.grid.pickups_remaining()
    );
    let engine = GameEngine::with_rng(level, config, StdRng::seed_from_u64(seed));

    let state = Arc::new(Mutex::new(ServerState::new(engine)));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/state", get(state_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!("static file root: {}", static_dir.to_string_lossy());
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found; serving the API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {bind_addr}: {err}");
            std::process::exit(1);
        }
    };

    info!("listening on :{port}");
    if let Err(err) = axum::serve(listener, app).await {
        error!("server runtime failed: {err}");
        std::process::exit(1);
    }
}

fn resolve_seed(cli_seed: Option<u64>, env_seed: Option<&str>) -> u64 {
    cli_seed
        .or_else(|| env_seed.and_then(|raw| raw.trim().parse::<u64>().ok()))
        .unwrap_or_else(rand::random::<u64>)
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn state_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let mut guard = state.lock().await;
    Json(guard.engine.build_snapshot(false))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        guard
            .clients
            .insert(client_id.clone(), ClientContext { tx: tx.clone() });
        send_initial_state(&mut guard, &client_id);
        info!("{client_id} connected ({} clients)", guard.clients.len());
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                let mut guard = state.lock().await;
                handle_client_message(&mut guard, &client_id, raw.as_str());
            }
            Message::Binary(raw) => {
                let mut guard = state.lock().await;
                match std::str::from_utf8(&raw) {
                    Ok(text) => handle_client_message(&mut guard, &client_id, text),
                    Err(_) => send_error(&mut guard, &client_id, "invalid utf8 message"),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
        info!("{client_id} disconnected ({} clients)", guard.clients.len());
    }
    drop(tx);
    let _ = writer.await;
}

fn send_initial_state(state: &mut ServerState, client_id: &str) {
    let world = ServerMessage::World {
        world: state.engine.get_world_init(),
    };
    send_to_client(state, client_id, &world, QueuePolicy::DisconnectOnFull);
    let snapshot = ServerMessage::State {
        snapshot: state.engine.build_snapshot(false),
    };
    send_to_client(state, client_id, &snapshot, QueuePolicy::DisconnectOnFull);
}

fn handle_client_message(state: &mut ServerState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error(state, client_id, "invalid message");
        return;
    };

    match message {
        ParsedClientMessage::Start => {
            if !state.engine.start() {
                send_error(state, client_id, "session already started");
            }
        }
        ParsedClientMessage::Restart => {
            if !state.engine.restart() {
                send_error(state, client_id, "restart is only allowed after game over");
            }
        }
        ParsedClientMessage::Input { dir } => {
            state.engine.request_direction(dir);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                state,
                client_id,
                &ServerMessage::Pong { t },
                QueuePolicy::DisconnectOnFull,
            );
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
    state.engine.step(TICK_SECS);
    if state.clients.is_empty() {
        return;
    }
    let message = ServerMessage::State {
        snapshot: state.engine.build_snapshot(true),
    };
    broadcast(state, &message, QueuePolicy::DropOnFull);
}

fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            error!("failed to encode server message: {err}");
            None
        }
    }
}

fn send_to_client(
    state: &mut ServerState,
    client_id: &str,
    message: &ServerMessage,
    policy: QueuePolicy,
) {
    let Some(payload) = encode(message) else {
        return;
    };
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client.tx.try_send(OutboundMessage::Text(payload)).is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &ServerMessage, policy: QueuePolicy) {
    let Some(payload) = encode(message) else {
        return;
    };
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    if let Some(client) = state.clients.remove(client_id) {
        warn!("{client_id} outbound queue full, disconnecting");
        let _ = client.tx.try_send(OutboundMessage::Close {
            code: 1008,
            reason: "outbound queue full".to_string(),
        });
    }
}

fn send_error(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &ServerMessage::Error {
            message: message.to_string(),
        },
        QueuePolicy::DisconnectOnFull,
    );
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_chase_engine::types::{Direction, SessionState};
    use maze_chase_engine::world::Level;
    use serde_json::Value;

    fn state_with_client(capacity: usize) -> (ServerState, mpsc::Receiver<OutboundMessage>) {
        let engine = GameEngine::with_rng(
            Level::classic().expect("built-in level"),
            EngineConfig::default(),
            StdRng::seed_from_u64(7),
        );
        let mut state = ServerState::new(engine);
        let (tx, rx) = mpsc::channel(capacity);
        state
            .clients
            .insert("client_test".to_string(), ClientContext { tx });
        (state, rx)
    }

    fn next_json(rx: &mut mpsc::Receiver<OutboundMessage>) -> Value {
        match rx.try_recv().expect("queued message") {
            OutboundMessage::Text(payload) => serde_json::from_str(&payload).expect("valid json"),
            OutboundMessage::Close { .. } => panic!("unexpected close"),
        }
    }

    #[test]
    fn seed_prefers_cli_then_env() {
        assert_eq!(resolve_seed(Some(5), Some("9")), 5);
        assert_eq!(resolve_seed(None, Some(" 9 ")), 9);
    }

    #[test]
    fn initial_state_sends_world_then_snapshot() {
        let (mut state, mut rx) = state_with_client(8);
        send_initial_state(&mut state, "client_test");
        let world = next_json(&mut rx);
        assert_eq!(world["type"], "world");
        assert_eq!(world["world"]["width"], 28);
        let snapshot = next_json(&mut rx);
        assert_eq!(snapshot["type"], "state");
        assert_eq!(snapshot["snapshot"]["state"], "menu");
    }

    #[test]
    fn start_and_input_drive_the_engine() {
        let (mut state, mut rx) = state_with_client(8);
        handle_client_message(&mut state, "client_test", r#"{"type":"start"}"#);
        assert_eq!(state.engine.state(), SessionState::Playing);
        handle_client_message(&mut state, "client_test", r#"{"type":"input","dir":"left"}"#);
        assert_eq!(state.engine.player().queued(), Direction::Left);
        assert!(rx.try_recv().is_err());

        handle_client_message(&mut state, "client_test", r#"{"type":"start"}"#);
        let reply = next_json(&mut rx);
        assert_eq!(reply["type"], "error");
    }

    #[test]
    fn restart_outside_game_over_is_an_error() {
        let (mut state, mut rx) = state_with_client(8);
        handle_client_message(&mut state, "client_test", r#"{"type":"restart"}"#);
        assert_eq!(state.engine.state(), SessionState::Menu);
        assert_eq!(next_json(&mut rx)["type"], "error");
    }

    #[test]
    fn ping_is_answered_and_garbage_rejected() {
        let (mut state, mut rx) = state_with_client(8);
        handle_client_message(&mut state, "client_test", r#"{"type":"ping","t":3.5}"#);
        let pong = next_json(&mut rx);
        assert_eq!(pong["type"], "pong");
        assert_eq!(pong["t"], 3.5);

        handle_client_message(&mut state, "client_test", "{");
        assert_eq!(next_json(&mut rx)["message"], "invalid message");
    }

    #[test]
    fn tick_broadcasts_state_with_events() {
        let (mut state, mut rx) = state_with_client(8);
        state.engine.start();
        tick_game(&mut state);
        let message = next_json(&mut rx);
        assert_eq!(message["type"], "state");
        assert_eq!(message["snapshot"]["tick"], 1);
        assert_eq!(message["snapshot"]["events"][0]["type"], "session_started");
    }

    #[test]
    fn full_queue_drops_state_but_disconnects_on_direct_reply() {
        let (mut state, _rx) = state_with_client(1);
        tick_game(&mut state);
        tick_game(&mut state);
        assert!(state.clients.contains_key("client_test"));

        send_error(&mut state, "client_test", "boom");
        assert!(!state.clients.contains_key("client_test"));
    }
}

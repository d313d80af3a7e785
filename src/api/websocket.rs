//! WebSocket handler for live route events
//!
//! Connected clients receive every [`RouteEvent`] the refresh service
//! publishes, optionally filtered by event type.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::api::server::AppState;
use crate::refresh::RouteEvent;

/// Unique client identifier
static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

/// Commands that can be received via WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WebSocketCommand {
    /// Subscribe to specific event types
    Subscribe { events: Vec<String> },

    /// Unsubscribe from specific event types
    Unsubscribe { events: Vec<String> },

    /// Ping request, answered with a pong to the sender only
    Ping { timestamp: u64 },
}

/// Connected client information
#[derive(Debug)]
struct ClientInfo {
    id: u64,
    subscribed_events: Vec<String>,
    tx: mpsc::Sender<RouteEvent>,
}

impl ClientInfo {
    fn wants(&self, event_type: &str) -> bool {
        self.subscribed_events.is_empty()
            || self.subscribed_events.iter().any(|e| e == "*" || e == event_type)
    }
}

/// WebSocket handler for managing connections and broadcasting events
pub struct WebSocketHandler {
    /// Connected clients
    clients: RwLock<HashMap<u64, ClientInfo>>,

    /// Keepalive ping interval
    ping_interval: Duration,
}

impl WebSocketHandler {
    /// Create a new WebSocket handler
    pub fn new() -> Self {
        Self::with_ping_interval(Duration::from_secs(30))
    }

    /// Create a new WebSocket handler with custom ping interval
    pub fn with_ping_interval(ping_interval: Duration) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            ping_interval,
        }
    }

    /// Send an event to every client subscribed to its type
    pub async fn broadcast(&self, event: RouteEvent) {
        let clients = self.clients.read().await;
        let event_type = event.type_name();

        for client in clients.values().filter(|c| c.wants(event_type)) {
            if let Err(e) = client.tx.try_send(event.clone()) {
                warn!("Failed to send {} to client {}: {}", event_type, client.id, e);
            }
        }
    }

    /// Relay events from the refresh service until the channel closes
    pub async fn forward(&self, mut events: broadcast::Receiver<RouteEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.broadcast(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("WebSocket relay lagged, {} events dropped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Get the number of connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Add a new client
    async fn add_client(&self, tx: mpsc::Sender<RouteEvent>) -> u64 {
        let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::SeqCst);

        let client = ClientInfo {
            id: client_id,
            subscribed_events: vec![], // Empty means all events
            tx,
        };

        self.clients.write().await.insert(client_id, client);

        info!("WebSocket client {} connected", client_id);

        client_id
    }

    /// Remove a client
    async fn remove_client(&self, client_id: u64) {
        self.clients.write().await.remove(&client_id);
        info!("WebSocket client {} disconnected", client_id);
    }

    /// Send an event to a single client
    async fn send_to(&self, client_id: u64, event: RouteEvent) {
        if let Some(client) = self.clients.read().await.get(&client_id) {
            let _ = client.tx.try_send(event);
        }
    }

    /// Update client subscriptions
    async fn subscribe_client(&self, client_id: u64, events: Vec<String>) {
        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            for event in events {
                if !client.subscribed_events.contains(&event) {
                    client.subscribed_events.push(event);
                }
            }
            debug!("Client {} subscribed to: {:?}", client_id, client.subscribed_events);
        }
    }

    /// Remove client subscriptions
    async fn unsubscribe_client(&self, client_id: u64, events: Vec<String>) {
        if let Some(client) = self.clients.write().await.get_mut(&client_id) {
            client.subscribed_events.retain(|e| !events.contains(e));
            debug!(
                "Client {} unsubscribed, now subscribed to: {:?}",
                client_id, client.subscribed_events
            );
        }
    }
}

impl Default for WebSocketHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn encode(event: &RouteEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            warn!("Failed to encode {}: {}", event.type_name(), e);
            None
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for sending events to this client
    let (tx, mut rx) = mpsc::channel::<RouteEvent>(256);

    // Register client
    let client_id = state.ws_handler.add_client(tx).await;

    let connected = RouteEvent::Connected {
        client_id,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let sent = match encode(&connected) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !sent {
        state.ws_handler.remove_client(client_id).await;
        return;
    }

    let ping_interval = state.ws_handler.ping_interval;

    // Task to send events to client
    let mut send_task = tokio::spawn(async move {
        let mut ping_timer = tokio::time::interval(ping_interval);

        loop {
            let event = tokio::select! {
                Some(event) = rx.recv() => event,
                _ = ping_timer.tick() => RouteEvent::Ping { timestamp: unix_millis() },
                else => break,
            };

            if let Some(msg) = encode(&event) {
                if sender.send(msg).await.is_err() {
                    break;
                }
            }
        }
    });

    let ws_handler_recv = state.ws_handler.clone();

    // Task to receive messages from client
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<WebSocketCommand>(&text) {
                    Ok(WebSocketCommand::Subscribe { events }) => {
                        ws_handler_recv.subscribe_client(client_id, events).await;
                    }
                    Ok(WebSocketCommand::Unsubscribe { events }) => {
                        ws_handler_recv.unsubscribe_client(client_id, events).await;
                    }
                    Ok(WebSocketCommand::Ping { timestamp }) => {
                        ws_handler_recv
                            .send_to(client_id, RouteEvent::Pong { timestamp })
                            .await;
                    }
                    Err(e) => {
                        debug!("Failed to parse WebSocket message: {}", e);
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    // Clean up
    state.ws_handler.remove_client(client_id).await;
}

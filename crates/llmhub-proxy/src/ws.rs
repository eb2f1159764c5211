//! WebSocket duplex adapter.
//!
//! One long-lived connection carries any number of generation requests,
//! one at a time. Each request produces a sequence of `chunk` frames and
//! a final `done` frame; failures become an `error` frame and the
//! connection stays open for the next request.
//!
//! ## Protocol
//!
//! | Direction | Frame |
//! |---|---|
//! | Client → Server | `{"type":"chat","payload":{"model","messages","options?","endpoint?"}}` |
//! | Server → Client | `{"type":"chunk","data":"..."}` repeated |
//! | Server → Client | `{"type":"done"}` on success |
//! | Server → Client | `{"type":"error","error":"..."}` on failure |
//!
//! A `chat` frame arriving while a generation is streaming is refused
//! with an `error` frame; the running stream is not disturbed. Closing
//! the socket mid-stream cancels the upstream request.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::future;
use tracing::info;

use llmhub_core::{ChatMessage, RoutingPayload, RoutingRequest, select_node};

use crate::models::default_options;
use crate::relay::open_relay;
use crate::server::AppState;

/// Inbound frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsRequest {
    Chat { payload: ChatPayload },
}

/// Payload of an inbound `chat` frame. Streaming is implied on this
/// transport.
#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_options")]
    pub options: serde_json::Value,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl From<ChatPayload> for RoutingRequest {
    fn from(payload: ChatPayload) -> Self {
        Self {
            model: payload.model,
            payload: RoutingPayload::Chat(payload.messages),
            stream: true,
            options: payload.options,
            endpoint_hint: payload.endpoint,
        }
    }
}

/// Outbound frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WsEvent {
    Chunk { data: String },
    Done,
    Error { error: String },
}

/// `GET /ws` — upgrade to the duplex generation protocol.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("WebSocket client connected");

    let (sender, mut receiver) = socket.split();
    let mut sink = sender.with(|event: WsEvent| {
        let text = serde_json::to_string(&event).unwrap_or_default();
        future::ready(Ok::<Message, axum::Error>(Message::Text(text.into())))
    });

    while let Some(message) = receiver.next().await {
        let Ok(message) = message else { break };
        match message {
            Message::Text(text) => match serde_json::from_str::<WsRequest>(text.as_str()) {
                Ok(WsRequest::Chat { payload }) => {
                    run_generation(&state, payload, &mut sink, &mut receiver).await;
                }
                Err(e) => {
                    let event = WsEvent::Error {
                        error: format!("unrecognized message: {e}"),
                    };
                    if sink.send(event).await.is_err() {
                        break;
                    }
                }
            },
            Message::Close(_) => break,
            // Ping/pong and binary frames are ignored.
            _ => {}
        }
    }

    info!("WebSocket client disconnected");
}

/// Drive one generation: select a node, relay, and stream the chunks as
/// frames. Keeps watching the inbound side so a socket close cancels the
/// upstream request instead of leaving it running.
async fn run_generation<S, R>(state: &AppState, payload: ChatPayload, sink: &mut S, inbound: &mut R)
where
    S: Sink<WsEvent> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let request: RoutingRequest = payload.into();

    let nodes = state.registry.list().await;
    let node = match select_node(&nodes, request.endpoint_hint.as_deref()) {
        Ok(node) => node.clone(),
        Err(e) => {
            let _ = sink.send(WsEvent::Error { error: e.to_string() }).await;
            return;
        }
    };

    info!(endpoint = %node.endpoint, model = %request.model, "Proxying generation over WebSocket");

    let upstream = match open_relay(&state.client, &node, &request).await {
        Ok(upstream) => upstream,
        Err(e) => {
            let _ = sink.send(WsEvent::Error { error: e.to_string() }).await;
            return;
        }
    };

    let mut chunks = upstream.bytes_stream();
    loop {
        tokio::select! {
            chunk = chunks.next() => match chunk {
                Some(Ok(chunk)) => {
                    let data = String::from_utf8_lossy(&chunk).into_owned();
                    if sink.send(WsEvent::Chunk { data }).await.is_err() {
                        // Client is gone; dropping `chunks` aborts the upstream.
                        return;
                    }
                }
                Some(Err(e)) => {
                    let event = WsEvent::Error {
                        error: format!("stream interrupted: {e}"),
                    };
                    let _ = sink.send(event).await;
                    return;
                }
                None => {
                    let _ = sink.send(WsEvent::Done).await;
                    return;
                }
            },
            interruption = inbound.next() => match interruption {
                Some(Ok(Message::Text(_))) => {
                    // One generation per connection at a time.
                    let event = WsEvent::Error {
                        error: "a generation is already in progress on this connection"
                            .to_string(),
                    };
                    if sink.send(event).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{DEFAULT_PROBE_TIMEOUT, HealthProber};
    use crate::registry::NodeRegistry;
    use crate::test_support::{spawn_drop_sentinel_node, spawn_fake_node};
    use futures_util::stream;
    use llmhub_core::{NodeDescriptor, NodeKind, NodeLocation};
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::PollSender;

    fn descriptor(endpoint: &str) -> NodeDescriptor {
        NodeDescriptor {
            name: "test".to_string(),
            endpoint: endpoint.to_string(),
            kind: NodeKind::Ollama,
            location: NodeLocation::Local,
        }
    }

    fn test_state() -> AppState {
        AppState {
            registry: NodeRegistry::new(),
            prober: HealthProber::new(DEFAULT_PROBE_TIMEOUT).unwrap(),
            client: reqwest::Client::new(),
        }
    }

    fn chat_payload(endpoint: Option<&str>) -> ChatPayload {
        ChatPayload {
            model: "qwen3:8b".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            options: default_options(),
            endpoint: endpoint.map(ToString::to_string),
        }
    }

    async fn collect_events(
        state: &AppState,
        payload: ChatPayload,
        inbound: impl Stream<Item = Result<Message, axum::Error>> + Unpin,
    ) -> Vec<WsEvent> {
        let (tx, mut rx) = tokio::sync::mpsc::channel(32);
        let mut sink = PollSender::new(tx);
        let mut inbound = inbound;

        run_generation(state, payload, &mut sink, &mut inbound).await;
        drop(sink);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn frames_match_the_wire_protocol() {
        assert_eq!(
            serde_json::to_value(WsEvent::Chunk {
                data: "x".to_string()
            })
            .unwrap(),
            json!({ "type": "chunk", "data": "x" })
        );
        assert_eq!(
            serde_json::to_value(WsEvent::Done).unwrap(),
            json!({ "type": "done" })
        );
        assert_eq!(
            serde_json::to_value(WsEvent::Error {
                error: "boom".to_string()
            })
            .unwrap(),
            json!({ "type": "error", "error": "boom" })
        );

        let inbound: WsRequest = serde_json::from_value(json!({
            "type": "chat",
            "payload": {
                "model": "qwen3:8b",
                "messages": [{ "role": "user", "content": "hi" }],
                "endpoint": "http://a:11434"
            }
        }))
        .unwrap();
        let WsRequest::Chat { payload } = inbound;
        assert_eq!(payload.model, "qwen3:8b");
        assert_eq!(payload.endpoint.as_deref(), Some("http://a:11434"));
    }

    #[tokio::test]
    async fn generation_streams_chunks_then_done() {
        let state = test_state();
        let endpoint =
            spawn_fake_node(vec!["qwen3:8b".into()], vec!["a".into(), "b".into(), "c".into()])
                .await;
        let node = state.registry.add(descriptor(&endpoint)).await;
        state.prober.probe(&state.registry, node.id).await;

        let events = collect_events(&state, chat_payload(None), stream::pending()).await;

        assert_eq!(
            events,
            [
                WsEvent::Chunk { data: "a".to_string() },
                WsEvent::Chunk { data: "b".to_string() },
                WsEvent::Chunk { data: "c".to_string() },
                WsEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn selection_failure_is_a_single_error_frame() {
        let state = test_state();
        state.registry.add(descriptor("http://127.0.0.1:1")).await;

        let events = collect_events(
            &state,
            chat_payload(Some("http://127.0.0.1:1")),
            stream::pending(),
        )
        .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            WsEvent::Error { error } => assert!(error.contains("offline")),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_nodes_is_an_error_frame_not_a_hangup() {
        let state = test_state();
        let events = collect_events(&state, chat_payload(None), stream::pending()).await;

        assert_eq!(
            events,
            [WsEvent::Error {
                error: "no online compute nodes available".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn second_request_mid_stream_is_refused_without_killing_the_stream() {
        let state = test_state();
        let endpoint =
            spawn_fake_node(vec!["qwen3:8b".into()], vec!["a".into(), "b".into(), "c".into()])
                .await;
        let node = state.registry.add(descriptor(&endpoint)).await;
        state.prober.probe(&state.registry, node.id).await;

        let second_request = serde_json::to_string(&json!({
            "type": "chat",
            "payload": { "model": "qwen3:8b", "messages": [] }
        }))
        .unwrap();
        let inbound = stream::iter(vec![Ok::<Message, axum::Error>(Message::Text(
            second_request.into(),
        ))])
        .chain(stream::pending());

        let events = collect_events(&state, chat_payload(None), inbound).await;

        let busy: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, WsEvent::Error { error } if error.contains("in progress")))
            .collect();
        assert_eq!(busy.len(), 1);

        let chunks: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WsEvent::Chunk { data } => Some(data.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(chunks, ["a", "b", "c"]);
        assert_eq!(events.last(), Some(&WsEvent::Done));
    }

    #[tokio::test]
    async fn socket_close_cancels_the_upstream_request() {
        let state = test_state();
        let (endpoint, mut dropped) = spawn_drop_sentinel_node().await;
        let node = state.registry.add(descriptor(&endpoint)).await;
        state.prober.probe(&state.registry, node.id).await;

        let inbound = stream::iter(vec![Ok::<Message, axum::Error>(Message::Close(None))])
            .chain(stream::pending());

        let events = tokio::time::timeout(
            Duration::from_secs(2),
            collect_events(&state, chat_payload(None), inbound),
        )
        .await
        .expect("generation did not stop on close");

        assert!(!events.contains(&WsEvent::Done));

        tokio::time::timeout(Duration::from_secs(2), dropped.recv())
            .await
            .expect("upstream was not aborted")
            .expect("sentinel channel closed early");
    }
}

//! Ad-hoc upstream servers for tests: fake inference nodes bound to
//! ephemeral ports.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use llmhub_core::{Node, NodeHealth, NodeKind, NodeLocation};

/// A node snapshot already marked online, for feeding the relay directly.
pub(crate) fn online_node(endpoint: &str, models: &[&str]) -> Node {
    Node {
        id: Uuid::new_v4(),
        name: "fake".to_string(),
        endpoint: endpoint.trim_end_matches('/').to_string(),
        kind: NodeKind::Ollama,
        location: NodeLocation::Local,
        health: NodeHealth::Online {
            models: models.iter().map(ToString::to_string).collect(),
        },
        last_probed: None,
    }
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn stream_chunks(chunks: Vec<String>) -> Response {
    // Small gaps keep the chunks in separate frames on the wire.
    let stream = futures_util::stream::iter(chunks).then(|chunk| async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        Ok::<_, std::io::Error>(Bytes::from(chunk))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/x-ndjson")
        .body(Body::from_stream(stream))
        .unwrap()
}

/// An Ollama-shaped node: `/api/tags` lists `models`, the generation
/// paths stream `chunks` one frame at a time.
pub(crate) async fn spawn_fake_node(models: Vec<String>, chunks: Vec<String>) -> String {
    let tags = {
        let models = models.clone();
        move || {
            let models = models.clone();
            async move {
                let entries: Vec<_> = models
                    .iter()
                    .map(|name| serde_json::json!({ "name": name }))
                    .collect();
                axum::Json(serde_json::json!({ "models": entries }))
            }
        }
    };

    let generation = {
        let chunks = chunks.clone();
        move || {
            let chunks = chunks.clone();
            async move { stream_chunks(chunks) }
        }
    };

    spawn(
        Router::new()
            .route("/api/tags", get(tags))
            .route("/api/chat", post(generation.clone()))
            .route("/api/generate", post(generation)),
    )
    .await
}

/// A node that probes healthy but rejects every generation request.
pub(crate) async fn spawn_error_node(status: u16, body: &str) -> String {
    let body = body.to_string();
    let reject = move || {
        let body = body.clone();
        async move {
            (
                StatusCode::from_u16(status).unwrap(),
                body,
            )
        }
    };

    spawn(
        Router::new()
            .route(
                "/api/tags",
                get(|| async { axum::Json(serde_json::json!({ "models": [] })) }),
            )
            .route("/api/chat", post(reject.clone()))
            .route("/api/generate", post(reject)),
    )
    .await
}

/// Accepts TCP connections and never answers; probes against it can only
/// end by timeout.
pub(crate) async fn spawn_black_hole() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            match listener.accept().await {
                Ok((socket, _)) => held.push(socket),
                Err(_) => break,
            }
        }
    });
    format!("http://{addr}")
}

struct DropSignal {
    tx: mpsc::UnboundedSender<()>,
}

impl Drop for DropSignal {
    fn drop(&mut self) {
        let _ = self.tx.send(());
    }
}

/// A node whose generation response emits one chunk and then hangs; the
/// returned receiver fires when the server side drops the response body,
/// i.e. when the relay actually aborted the upstream request.
pub(crate) async fn spawn_drop_sentinel_node() -> (String, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let generation = move || {
        let tx = tx.clone();
        async move {
            let guard = DropSignal { tx };
            let head = futures_util::stream::once(async {
                Ok::<_, std::io::Error>(Bytes::from_static(b"first"))
            });
            let tail = futures_util::stream::poll_fn(move |_| {
                let _hold = &guard;
                std::task::Poll::<Option<Result<Bytes, std::io::Error>>>::Pending
            });

            Response::builder()
                .status(StatusCode::OK)
                .header("content-type", "application/x-ndjson")
                .body(Body::from_stream(head.chain(tail)))
                .unwrap()
        }
    };

    let endpoint = spawn(
        Router::new()
            .route(
                "/api/tags",
                get(|| async { axum::Json(serde_json::json!({ "models": ["m"] })) }),
            )
            .route("/api/chat", post(generation.clone()))
            .route("/api/generate", post(generation)),
    )
    .await;

    (endpoint, rx)
}

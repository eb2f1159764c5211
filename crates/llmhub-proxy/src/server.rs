//! Axum HTTP surface: node management, model listing and the streaming
//! generation endpoints.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use chrono::Utc;
use reqwest::Client;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use llmhub_core::{NodeDescriptor, RoutingRequest, select_node};

use crate::config::{CorsConfig, HubConfig};
use crate::error::HttpError;
use crate::models::{
    ChatProxyRequest, CheckNodeResponse, CheckSummaryResponse, EndpointQuery,
    GenerateProxyRequest, HealthResponse, ModelsResponse, NodeView, NodesResponse,
};
use crate::probe::HealthProber;
use crate::registry::NodeRegistry;
use crate::relay::{open_relay, streaming_response};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: NodeRegistry,
    pub prober: HealthProber,
    /// Relay client. Deliberately has no global timeout: generation
    /// streams run as long as the upstream keeps talking.
    pub client: Client,
}

/// Build the full router for the given state.
pub fn router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/nodes", get(list_nodes).post(add_node))
        .route("/api/nodes/{id}", delete(remove_node))
        .route("/api/models", get(list_models))
        .route("/api/check", get(check))
        .route("/api/chat", post(chat))
        .route("/api/generate", post(generate))
        .route("/ws", get(crate::ws::ws_handler))
        .layer(build_cors_layer(cors))
        .with_state(state)
}

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Seed the registry, start the probe loop and run the server until
/// interrupted.
pub async fn serve(config: HubConfig) -> anyhow::Result<()> {
    let registry = NodeRegistry::from_seeds(config.seed_descriptors()).await;
    let prober = HealthProber::new(config.probe_timeout)?;
    let state = AppState {
        registry: registry.clone(),
        prober: prober.clone(),
        client: Client::new(),
    };

    let cancel = CancellationToken::new();
    let probe_loop = prober.spawn_refresh_loop(registry, config.probe_interval, cancel.clone());

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let addr = listener.local_addr()?;
    info!("llmhub proxy listening on {addr}");

    let app = router(state, &config.cors);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await;

    cancel.cancel();
    probe_loop.await?;
    result?;

    info!("llmhub proxy shut down");
    Ok(())
}

/// `GET /health` — process status and the node list as currently known,
/// no probing.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let nodes = state.registry.list().await.into_iter().map(NodeView::from).collect();
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        nodes,
    })
}

/// `GET /api/nodes` — refresh every node, then report.
async fn list_nodes(State(state): State<AppState>) -> Json<NodesResponse> {
    state.prober.probe_all(&state.registry).await;
    let nodes = state.registry.list().await.into_iter().map(NodeView::from).collect();
    Json(NodesResponse { nodes })
}

/// `POST /api/nodes` — register a node and probe it right away.
///
/// The probe is best-effort: an unreachable endpoint still registers,
/// it just stays offline.
async fn add_node(
    State(state): State<AppState>,
    Json(descriptor): Json<NodeDescriptor>,
) -> Result<(StatusCode, Json<NodeView>), HttpError> {
    if descriptor.endpoint.trim().is_empty() {
        return Err(HttpError::BadRequest("endpoint must not be empty".to_string()));
    }

    let node = state.registry.add(descriptor).await;
    let node = state
        .prober
        .probe(&state.registry, node.id)
        .await
        .unwrap_or(node);

    Ok((StatusCode::CREATED, Json(NodeView::from(node))))
}

/// `DELETE /api/nodes/{id}`.
async fn remove_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError> {
    if state.registry.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::NotFound(format!("no compute node with id {id}")))
    }
}

/// `GET /api/models` — models of one node after a fresh probe, or the
/// de-duplicated union across all online nodes.
async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<EndpointQuery>,
) -> Result<Json<ModelsResponse>, HttpError> {
    if let Some(endpoint) = query.endpoint {
        let node = lookup_and_probe(&state, &endpoint).await?;
        if !node.is_online() {
            return Err(HttpError::ServiceUnavailable(format!(
                "compute node is offline: {}",
                node.endpoint
            )));
        }
        return Ok(Json(ModelsResponse {
            models: node.health.models().to_vec(),
        }));
    }

    state.prober.probe_all(&state.registry).await;

    // Union across online nodes, first-seen order. Offline nodes
    // contribute nothing, so no nodes online means an empty list.
    let mut models: Vec<String> = Vec::new();
    for node in state.registry.list().await {
        for model in node.health.models() {
            if !models.contains(model) {
                models.push(model.clone());
            }
        }
    }

    Ok(Json(ModelsResponse { models }))
}

/// `GET /api/check` — liveness of one node, or an aggregate summary.
async fn check(
    State(state): State<AppState>,
    Query(query): Query<EndpointQuery>,
) -> Result<Response, HttpError> {
    if let Some(endpoint) = query.endpoint {
        let node = lookup_and_probe(&state, &endpoint).await?;
        return Ok(Json(CheckNodeResponse {
            connected: node.is_online(),
            endpoint: node.endpoint.clone(),
            models: node.health.models().to_vec(),
        })
        .into_response());
    }

    state.prober.probe_all(&state.registry).await;
    let nodes = state.registry.list().await;
    let online_nodes = nodes.iter().filter(|n| n.is_online()).count();

    Ok(Json(CheckSummaryResponse {
        connected: online_nodes > 0,
        online_nodes,
        total_nodes: nodes.len(),
        nodes: nodes.into_iter().map(NodeView::from).collect(),
    })
    .into_response())
}

/// `POST /api/chat` — select a node and stream its chat response back.
async fn chat(State(state): State<AppState>, Json(request): Json<ChatProxyRequest>) -> Response {
    relay_generation(&state, request.into()).await
}

/// `POST /api/generate` — completion flavour of [`chat`].
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateProxyRequest>,
) -> Response {
    relay_generation(&state, request.into()).await
}

/// The shared transport-independent path: select, relay, stream.
pub(crate) async fn relay_generation(state: &AppState, request: RoutingRequest) -> Response {
    let nodes = state.registry.list().await;
    let node = match select_node(&nodes, request.endpoint_hint.as_deref()) {
        Ok(node) => node.clone(),
        Err(e) => return HttpError::from(e).into_response(),
    };

    info!(endpoint = %node.endpoint, model = %request.model, "Proxying generation request");

    match open_relay(&state.client, &node, &request).await {
        Ok(upstream) => streaming_response(upstream),
        Err(e) => HttpError::from(e).into_response(),
    }
}

async fn lookup_and_probe(
    state: &AppState,
    endpoint: &str,
) -> Result<llmhub_core::Node, HttpError> {
    let node = state
        .registry
        .find_by_endpoint(endpoint)
        .await
        .ok_or_else(|| HttpError::NotFound(format!("compute node not found: {endpoint}")))?;

    state
        .prober
        .probe(&state.registry, node.id)
        .await
        .ok_or_else(|| HttpError::NotFound(format!("compute node not found: {endpoint}")))
}

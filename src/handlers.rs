use axum::extract::{Query as QueryParams, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    identity,
    models::*,
    state::AppState,
};

const NODE_ID_HEADER: &str = "x-node-id";

fn node_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(NODE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Banner endpoint: `GET /`.
pub async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "Distributed query router",
        status: "running",
        version: "2.0.0",
        features: vec![
            "node registration",
            "query submission",
            "fair work dispatch",
            "response aggregation",
            "idle reaping",
        ],
    })
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = state.clock.now();
    let core = state.core.lock().await;
    Json(HealthResponse {
        status: "healthy",
        timestamp: now,
        active_nodes: core.node_count(),
        active_queries: core.query_count(),
    })
}

/// `GET /status`.
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<StatusResponse> {
    let node_id = node_id_from_headers(&headers);
    let now = state.clock.now();

    let mut core = state.core.lock().await;
    if let Some(node_id) = &node_id {
        core.register_or_touch(node_id, None, None, now);
    }

    let nodes_info = core
        .nodes_iter()
        .map(|node| NodeSummary {
            node_id: node.node_id.clone(),
            last_seen: now - node.last_seen,
            queries_submitted: node.queries_submitted,
            responses_provided: node.responses_provided,
            capabilities: node.capabilities.clone(),
        })
        .collect();

    let queries_summary = core
        .queries_iter()
        .map(|query| QuerySummary {
            id: query.query_number,
            submitter: query.submitter_node_id.clone(),
            responses_count: query.responses.len(),
            assigned_nodes: query.assigned_nodes.len(),
            age: query.age(now),
        })
        .collect();

    Json(StatusResponse {
        server_status: "running",
        version: "2.0.0",
        active_nodes: core.node_count(),
        active_queries: core.query_count(),
        pending_queries: core.pending_count(),
        total_queries_processed: core.total_processed(),
        timestamp: now,
        configuration: ConfigurationView {
            max_queries_per_node: state.config.max_queries_per_node,
            node_timeout: state.config.node_timeout_secs,
            query_timeout: state.config.query_timeout_secs,
            max_responses_per_query: state.config.max_responses_per_query,
        },
        nodes_info,
        queries_summary,
    })
}

/// `POST /register`.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let node_id = node_id_from_headers(&headers).unwrap_or_else(identity::generate_node_id);
    let now = state.clock.now();

    let mut core = state.core.lock().await;
    core.register_or_touch(
        &node_id,
        Some(req.node_capabilities),
        Some(req.node_info),
        now,
    );

    Ok(Json(RegisterResponse {
        node_id,
        status: "registered",
        message: "node registered successfully",
    }))
}

/// `POST /query`.
pub async fn submit_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let node_id = node_id_from_headers(&headers).unwrap_or_else(identity::generate_node_id);
    let now = state.clock.now();

    let mut core = state.core.lock().await;
    let query_number = core.submit(&node_id, req.query, &state.config, now);
    let estimated_wait_time = (core.pending_count() as u64) * 5;

    Ok(Json(QueryResponse {
        query_number,
        node_id,
        status: "submitted",
        estimated_wait_time,
    }))
}

/// `GET /request`.
pub async fn poll(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DispatchedQueryView>>> {
    let Some(node_id) = node_id_from_headers(&headers) else {
        return Ok(Json(Vec::new()));
    };
    let now = state.clock.now();

    let mut core = state.core.lock().await;
    let dispatched = core.poll(&node_id, &state.config, now);

    let views = dispatched
        .into_iter()
        .map(|d| DispatchedQueryView {
            query_number: d.query_number,
            query: d.query,
            timestamp: d.timestamp,
            metadata: DispatchMetadataView {
                max_responses: d.metadata.max_responses,
                current_responses: d.metadata.current_responses,
                timeout: d.metadata.timeout,
            },
        })
        .collect();

    Ok(Json(views))
}

/// `POST /response`.
pub async fn submit_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<Json<SubmitResponseResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let node_id = node_id_from_headers(&headers).ok_or(ApiError::MissingNodeId)?;
    let now = state.clock.now();

    let mut core = state.core.lock().await;
    let total_responses = core.append_response(req.query_number, &node_id, req.response, now)?;

    Ok(Json(SubmitResponseResponse {
        message: "response recorded",
        query_number: req.query_number,
        node_id,
        total_responses,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResponsesQuery {
    pub query_number: u64,
}

/// `GET /response?query_number=N`.
pub async fn get_responses(
    State(state): State<AppState>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<ResponsesQuery>,
) -> Result<Json<Vec<String>>> {
    let node_id = node_id_from_headers(&headers);

    let core = state.core.lock().await;
    let responses = core.get_responses(params.query_number, node_id.as_deref())?;

    Ok(Json(responses))
}

/// `POST /end`.
pub async fn end_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EndRequest>,
) -> Result<Json<EndResponse>> {
    let node_id = node_id_from_headers(&headers);

    let mut core = state.core.lock().await;
    let success = core.end(req.query_number, node_id.as_deref())?;

    Ok(Json(EndResponse {
        success,
        query_number: req.query_number,
        message: if success {
            "query ended"
        } else {
            "query not found"
        },
    }))
}

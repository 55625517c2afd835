//! JSON request/response DTOs for every endpoint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// `POST /register` request body.
#[derive(Debug, Clone, Deserialize, Validate, Default)]
pub struct RegisterRequest {
    #[serde(default)]
    pub node_capabilities: HashMap<String, Value>,
    #[serde(default)]
    pub node_info: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub node_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

/// `POST /query` request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QueryRequest {
    #[validate(length(min = 1, message = "query must not be empty"))]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query_number: u64,
    pub node_id: String,
    pub status: &'static str,
    pub estimated_wait_time: u64,
}

/// One entry returned by `GET /request`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchedQueryView {
    pub query_number: u64,
    pub query: String,
    pub timestamp: f64,
    pub metadata: DispatchMetadataView,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchMetadataView {
    pub max_responses: usize,
    pub current_responses: usize,
    pub timeout: f64,
}

/// `POST /response` request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitResponseRequest {
    pub query_number: u64,
    #[validate(length(min = 1, message = "response must not be empty"))]
    pub response: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponseResponse {
    pub message: &'static str,
    pub query_number: u64,
    pub node_id: String,
    pub total_responses: usize,
}

/// `POST /end` request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EndRequest {
    pub query_number: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndResponse {
    pub success: bool,
    pub query_number: u64,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: f64,
    pub active_nodes: usize,
    pub active_queries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub node_id: String,
    pub last_seen: f64,
    pub queries_submitted: u64,
    pub responses_provided: u64,
    pub capabilities: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuerySummary {
    pub id: u64,
    pub submitter: String,
    pub responses_count: usize,
    pub assigned_nodes: usize,
    pub age: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationView {
    pub max_queries_per_node: usize,
    pub node_timeout: u64,
    pub query_timeout: u64,
    pub max_responses_per_query: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub server_status: &'static str,
    pub version: &'static str,
    pub active_nodes: usize,
    pub active_queries: usize,
    pub pending_queries: usize,
    pub total_queries_processed: u64,
    pub timestamp: f64,
    pub configuration: ConfigurationView,
    pub nodes_info: Vec<NodeSummary>,
    pub queries_summary: Vec<QuerySummary>,
}

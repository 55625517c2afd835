//! Node registry: tracks known worker nodes, their metadata, and liveness.

use std::collections::HashMap;

use serde_json::Value;

/// A known worker node.
#[derive(Debug, Clone)]
pub struct Node {
    pub node_id: String,
    pub registration_time: f64,
    pub last_seen: f64,
    pub capabilities: HashMap<String, Value>,
    pub info: HashMap<String, Value>,
    pub queries_submitted: u64,
    pub responses_provided: u64,
}

impl Node {
    fn new(node_id: String, now: f64) -> Self {
        Self {
            node_id,
            registration_time: now,
            last_seen: now,
            capabilities: HashMap::new(),
            info: HashMap::new(),
            queries_submitted: 0,
            responses_provided: 0,
        }
    }
}

/// In-memory registry of known nodes.
///
/// Not internally locked: callers hold the single server-wide mutex (see
/// `core.rs`) for the duration of any operation, per the spec's "one global
/// mutex, no nested locks" design note.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<String, Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Create the node on first sight, or refresh `last_seen` and
    /// shallow-merge metadata into the existing record. Never fails.
    pub fn register_or_touch(
        &mut self,
        node_id: &str,
        capabilities: Option<HashMap<String, Value>>,
        info: Option<HashMap<String, Value>>,
        now: f64,
    ) {
        let node = self
            .nodes
            .entry(node_id.to_string())
            .or_insert_with(|| Node::new(node_id.to_string(), now));

        node.last_seen = now;
        if let Some(caps) = capabilities {
            node.capabilities.extend(caps);
        }
        if let Some(info) = info {
            node.info.extend(info);
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn record_query_submitted(&mut self, node_id: &str) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.queries_submitted += 1;
        }
    }

    pub fn record_response_provided(&mut self, node_id: &str) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.responses_provided += 1;
        }
    }

    /// Remove nodes whose `last_seen` is older than `threshold` seconds.
    /// Returns the evicted ids.
    pub fn evict_idle(&mut self, now: f64, threshold: f64) -> Vec<String> {
        let stale: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, node)| now - node.last_seen > threshold)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.nodes.remove(id);
        }

        stale
    }
}

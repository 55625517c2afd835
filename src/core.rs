//! Bundles the node registry, query store, and dispatcher behind the single
//! global mutex the spec calls for — one lock, no nested locks, so deadlock
//! is structurally impossible.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::Config;
use crate::dispatch::{self, Dispatched};
use crate::node::{Node, NodeRegistry};
use crate::query::{Query, QueryPolicy, QueryStore, StoreError};

/// Everything mutated by request handlers and the reaper.
#[derive(Debug, Default)]
pub struct Core {
    pub nodes: NodeRegistry,
    pub queries: QueryStore,
}

impl Core {
    pub fn new() -> Self {
        Self {
            nodes: NodeRegistry::new(),
            queries: QueryStore::new(),
        }
    }

    pub fn register_or_touch(
        &mut self,
        node_id: &str,
        capabilities: Option<HashMap<String, Value>>,
        info: Option<HashMap<String, Value>>,
        now: f64,
    ) {
        self.nodes.register_or_touch(node_id, capabilities, info, now);
    }

    pub fn submit(&mut self, submitter_id: &str, text: String, config: &Config, now: f64) -> u64 {
        self.nodes.register_or_touch(submitter_id, None, None, now);
        let policy = QueryPolicy {
            max_responses: config.max_responses_per_query,
            timeout: config.query_timeout_secs as f64,
        };
        let query_number = self.queries.submit(submitter_id.to_string(), text, policy, now);
        self.nodes.record_query_submitted(submitter_id);
        query_number
    }

    pub fn poll(&mut self, requester_id: &str, config: &Config, now: f64) -> Vec<Dispatched> {
        dispatch::poll(
            &mut self.nodes,
            &mut self.queries,
            requester_id,
            now,
            config.max_queries_per_node,
            config.batch_cap,
        )
    }

    pub fn get_responses(
        &self,
        query_number: u64,
        requester_id: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        self.queries.get_responses(query_number, requester_id)
    }

    pub fn append_response(
        &mut self,
        query_number: u64,
        responder_id: &str,
        text: String,
        now: f64,
    ) -> Result<usize, StoreError> {
        let total = self
            .queries
            .append_response(query_number, responder_id, text, now)?;
        self.nodes.record_response_provided(responder_id);
        Ok(total)
    }

    pub fn end(&mut self, query_number: u64, requester_id: Option<&str>) -> Result<bool, StoreError> {
        self.queries.end(query_number, requester_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn query(&self, query_number: u64) -> Option<&Query> {
        self.queries.get(query_number)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub fn pending_count(&self) -> usize {
        self.queries.pending_len()
    }

    pub fn total_processed(&self) -> u64 {
        self.queries.counter()
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn queries_iter(&self) -> impl Iterator<Item = &Query> {
        self.queries.iter()
    }

    /// One reaper sweep: expire timed-out queries, evict idle nodes, cap
    /// memory. Returns counts for logging.
    pub fn sweep(&mut self, config: &Config, now: f64) -> SweepSummary {
        let expired = self.queries.expire(now);
        let evicted = self
            .nodes
            .evict_idle(now, config.node_timeout_secs as f64);
        let capped = self.queries.cap(config.max_memory_size);

        SweepSummary {
            expired_queries: expired.len(),
            evicted_nodes: evicted.len(),
            capped_queries: capped.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepSummary {
    pub expired_queries: usize,
    pub evicted_nodes: usize,
    pub capped_queries: usize,
}

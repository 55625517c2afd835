//! Dispatcher: selects pending queries for a polling node under the
//! self-exclusion, capacity, and responses-met rules.

use crate::node::NodeRegistry;
use crate::query::{Query, QueryStore};

/// Metadata accompanying a dispatched query, as surfaced over `/request`.
#[derive(Debug, Clone)]
pub struct DispatchMetadata {
    pub max_responses: usize,
    pub current_responses: usize,
    pub timeout: f64,
}

/// A single query handed to a polling node.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub query_number: u64,
    pub query: String,
    pub timestamp: f64,
    pub metadata: DispatchMetadata,
}

/// Count of live queries (still in `queries`, regardless of pending state)
/// that already list `node_id` among their assigned nodes.
fn current_load(store: &QueryStore, node_id: &str) -> usize {
    store
        .iter()
        .filter(|q| q.assigned_nodes.iter().any(|n| n == node_id))
        .count()
}

/// Touches the requester's liveness, then walks `pending` in FIFO order,
/// assigning up to `batch_cap` eligible queries to it.
///
/// Traversal is explicit index-based scanning over the single `pending`
/// vector with in-place removal, per the spec's open-question resolution —
/// equivalent to copy-then-scan but clearer about ordering.
pub fn poll(
    registry: &mut NodeRegistry,
    store: &mut QueryStore,
    requester_id: &str,
    now: f64,
    max_queries_per_node: usize,
    batch_cap: usize,
) -> Vec<Dispatched> {
    registry.register_or_touch(requester_id, None, None, now);

    let mut dispatched = Vec::new();
    let mut load = current_load(store, requester_id);
    let mut index = 0;

    while index < store.pending().len() && dispatched.len() < batch_cap {
        let query_number = store.pending()[index];

        let Some(query) = store.get(query_number) else {
            store.remove_pending(query_number);
            continue;
        };

        if query.submitter_node_id == requester_id {
            index += 1;
            continue;
        }
        if query.assigned_nodes.iter().any(|n| n == requester_id) {
            index += 1;
            continue;
        }
        if query.is_complete() {
            store.remove_pending(query_number);
            continue;
        }
        if query.is_expired(now) {
            store.remove_pending(query_number);
            store_remove_query(store, query_number);
            continue;
        }
        if load >= max_queries_per_node {
            index += 1;
            continue;
        }

        let emitted = emit(query);
        store.assign(query_number, requester_id);
        dispatched.push(emitted);
        load += 1;
        index += 1;
    }

    dispatched
}

fn emit(query: &Query) -> Dispatched {
    Dispatched {
        query_number: query.query_number,
        query: query.query.clone(),
        timestamp: query.timestamp,
        metadata: DispatchMetadata {
            max_responses: query.policy.max_responses,
            current_responses: query.responses.len(),
            timeout: query.policy.timeout,
        },
    }
}

/// `QueryStore` has no public "delete unconditionally" primitive beyond
/// `end`/`expire`, both of which also touch `pending`; here `pending` was
/// already cleared above, so reuse `expire`'s semantics by directly
/// removing via `end` with no authorization check (the caller is the
/// dispatcher itself, not a requester).
fn store_remove_query(store: &mut QueryStore, query_number: u64) {
    let _ = store.end(query_number, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryPolicy;

    fn setup() -> (NodeRegistry, QueryStore) {
        let mut registry = NodeRegistry::new();
        registry.register_or_touch("a", None, None, 0.0);
        registry.register_or_touch("b", None, None, 0.0);
        registry.register_or_touch("c", None, None, 0.0);
        (registry, QueryStore::new())
    }

    #[test]
    fn submitter_never_receives_own_query() {
        let (mut registry, mut store) = setup();
        store.submit("a".into(), "hi".into(), QueryPolicy::default(), 0.0);

        let result = poll(&mut registry, &mut store, "a", 1.0, 5, 3);

        assert!(result.is_empty());
        assert_eq!(store.pending(), &[1]);
    }

    #[test]
    fn eligible_node_receives_and_is_marked_assigned() {
        let (mut registry, mut store) = setup();
        let qn = store.submit("a".into(), "hi".into(), QueryPolicy::default(), 0.0);

        let result = poll(&mut registry, &mut store, "b", 1.0, 5, 3);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].query_number, qn);
        assert_eq!(store.get(qn).unwrap().assigned_nodes, vec!["b".to_string()]);
    }

    #[test]
    fn same_node_never_receives_same_query_twice() {
        let (mut registry, mut store) = setup();
        store.submit("a".into(), "hi".into(), QueryPolicy::default(), 0.0);

        let first = poll(&mut registry, &mut store, "b", 1.0, 5, 3);
        let second = poll(&mut registry, &mut store, "b", 2.0, 5, 3);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn batch_cap_limits_results_per_call() {
        let (mut registry, mut store) = setup();
        for i in 0..5 {
            store.submit("a".into(), format!("q{i}"), QueryPolicy::default(), i as f64);
        }

        let result = poll(&mut registry, &mut store, "b", 10.0, 5, 3);

        assert_eq!(result.len(), 3);
    }

    #[test]
    fn capacity_limit_skips_without_removing_from_pending() {
        let (mut registry, mut store) = setup();
        for i in 0..3 {
            store.submit("a".into(), format!("q{i}"), QueryPolicy::default(), i as f64);
        }

        // max_queries_per_node = 1: "b" can only take the first query.
        let first = poll(&mut registry, &mut store, "b", 10.0, 1, 3);
        assert_eq!(first.len(), 1);

        let second = poll(&mut registry, &mut store, "b", 11.0, 1, 3);
        assert!(second.is_empty());
        // The remaining two queries are still pending for other nodes.
        assert_eq!(store.pending_len(), 2);
    }

    #[test]
    fn complete_queries_are_not_dispatched_and_retire_from_pending() {
        let (mut registry, mut store) = setup();
        let policy = QueryPolicy {
            max_responses: 1,
            timeout: 180.0,
        };
        let qn = store.submit("a".into(), "hi".into(), policy, 0.0);
        store.assign(qn, "b");
        store.append_response(qn, "b", "done".into(), 1.0).unwrap();

        let result = poll(&mut registry, &mut store, "c", 2.0, 5, 3);

        assert!(result.is_empty());
        assert!(store.pending().is_empty());
    }

    #[test]
    fn expired_queries_are_deleted_during_poll() {
        let (mut registry, mut store) = setup();
        let policy = QueryPolicy {
            max_responses: 3,
            timeout: 5.0,
        };
        let qn = store.submit("a".into(), "hi".into(), policy, 0.0);

        let result = poll(&mut registry, &mut store, "b", 10.0, 5, 3);

        assert!(result.is_empty());
        assert!(store.get(qn).is_none());
        assert!(store.pending().is_empty());
    }

    #[test]
    fn poll_touches_requester_liveness() {
        let (mut registry, mut store) = setup();
        registry.register_or_touch("b", None, None, 0.0);

        poll(&mut registry, &mut store, "b", 50.0, 5, 3);

        assert_eq!(registry.get("b").unwrap().last_seen, 50.0);
    }
}

//! Query store: owns queries, their responses and assignments, and assigns
//! monotonic query numbers.

use thiserror::Error;

/// Errors raised by `QueryStore` operations, mapped onto HTTP status codes
/// one level up in `error.rs`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("query not found")]
    NotFound,

    #[error("requester is not the submitter of this query")]
    Unauthorized,

    #[error("a query's submitter cannot respond to its own query")]
    SelfResponseForbidden,

    #[error("node was never assigned this query")]
    NotAssigned,

    #[error("node already responded to this query")]
    Duplicate,
}

/// A single response to a query.
#[derive(Debug, Clone)]
pub struct ResponseEntry {
    pub node_id: String,
    pub response: String,
    pub timestamp: f64,
}

/// Per-query policy snapshot, taken at submission time.
#[derive(Debug, Clone, Copy)]
pub struct QueryPolicy {
    pub max_responses: usize,
    pub timeout: f64,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            max_responses: 3,
            timeout: 180.0,
        }
    }
}

/// A submitted query and everything known about its processing.
#[derive(Debug, Clone)]
pub struct Query {
    pub query_number: u64,
    pub query: String,
    pub submitter_node_id: String,
    pub timestamp: f64,
    pub assigned_nodes: Vec<String>,
    pub responses: Vec<ResponseEntry>,
    pub policy: QueryPolicy,
}

impl Query {
    pub fn is_complete(&self) -> bool {
        self.responses.len() >= self.policy.max_responses
    }

    pub fn is_expired(&self, now: f64) -> bool {
        now - self.timestamp > self.policy.timeout
    }

    pub fn age(&self, now: f64) -> f64 {
        now - self.timestamp
    }
}

/// Owns the query table, the FIFO pending list, and the query-number
/// counter. Not internally locked: see `node.rs`'s equivalent note.
#[derive(Debug, Default)]
pub struct QueryStore {
    counter: u64,
    queries: std::collections::HashMap<u64, Query>,
    pending: Vec<u64>,
}

impl QueryStore {
    pub fn new() -> Self {
        Self {
            counter: 0,
            queries: std::collections::HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn get(&self, query_number: u64) -> Option<&Query> {
        self.queries.get(&query_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Query> {
        self.queries.values()
    }

    pub fn pending(&self) -> &[u64] {
        &self.pending
    }

    /// Assigns the next query number, creates the query, and appends it to
    /// `pending`. Never fails.
    pub fn submit(
        &mut self,
        submitter_id: String,
        text: String,
        policy: QueryPolicy,
        now: f64,
    ) -> u64 {
        self.counter += 1;
        let query_number = self.counter;

        self.queries.insert(
            query_number,
            Query {
                query_number,
                query: text,
                submitter_node_id: submitter_id,
                timestamp: now,
                assigned_nodes: Vec::new(),
                responses: Vec::new(),
                policy,
            },
        );
        self.pending.push(query_number);

        query_number
    }

    /// Returns response texts in insertion order. Unknown queries yield an
    /// empty list rather than an error, per spec.
    pub fn get_responses(
        &self,
        query_number: u64,
        requester_id: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        let Some(query) = self.queries.get(&query_number) else {
            return Ok(Vec::new());
        };

        if let Some(requester_id) = requester_id {
            if requester_id != query.submitter_node_id {
                return Err(StoreError::Unauthorized);
            }
        }

        Ok(query.responses.iter().map(|r| r.response.clone()).collect())
    }

    /// Appends a response, enforcing self-response, assignment, and
    /// duplicate-response rules. Retires the query from `pending` once it
    /// reaches `max_responses`.
    pub fn append_response(
        &mut self,
        query_number: u64,
        responder_id: &str,
        text: String,
        now: f64,
    ) -> Result<usize, StoreError> {
        let query = self
            .queries
            .get_mut(&query_number)
            .ok_or(StoreError::NotFound)?;

        if responder_id == query.submitter_node_id {
            return Err(StoreError::SelfResponseForbidden);
        }
        if !query.assigned_nodes.iter().any(|n| n == responder_id) {
            return Err(StoreError::NotAssigned);
        }
        if query.responses.iter().any(|r| r.node_id == responder_id) {
            return Err(StoreError::Duplicate);
        }

        query.responses.push(ResponseEntry {
            node_id: responder_id.to_string(),
            response: text,
            timestamp: now,
        });
        let total = query.responses.len();
        let retire = query.is_complete();

        if retire {
            self.remove_pending(query_number);
        }

        Ok(total)
    }

    /// Soft delete: unknown query numbers return `Ok(false)` rather than an
    /// error.
    pub fn end(
        &mut self,
        query_number: u64,
        requester_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let Some(query) = self.queries.get(&query_number) else {
            return Ok(false);
        };

        if let Some(requester_id) = requester_id {
            if requester_id != query.submitter_node_id {
                return Err(StoreError::Unauthorized);
            }
        }

        self.remove_pending(query_number);
        self.queries.remove(&query_number);

        Ok(true)
    }

    /// Removes and returns every query older than its own timeout.
    pub fn expire(&mut self, now: f64) -> Vec<u64> {
        let expired: Vec<u64> = self
            .queries
            .values()
            .filter(|q| q.is_expired(now))
            .map(|q| q.query_number)
            .collect();

        for qn in &expired {
            self.queries.remove(qn);
            self.remove_pending(*qn);
        }

        expired
    }

    /// Drops the oldest queries by timestamp (ties broken by lower query
    /// number) until at most `max_size` remain.
    pub fn cap(&mut self, max_size: usize) -> Vec<u64> {
        if self.queries.len() <= max_size {
            return Vec::new();
        }

        let mut by_age: Vec<(f64, u64)> = self
            .queries
            .values()
            .map(|q| (q.timestamp, q.query_number))
            .collect();
        by_age.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap().then(a.1.cmp(&b.1)));

        let drop_count = self.queries.len() - max_size;
        let dropped: Vec<u64> = by_age.into_iter().take(drop_count).map(|(_, qn)| qn).collect();

        for qn in &dropped {
            self.queries.remove(qn);
            self.remove_pending(*qn);
        }

        dropped
    }

    /// Removes a single query number from `pending` if present, preserving
    /// the order of the remaining entries.
    pub fn remove_pending(&mut self, query_number: u64) {
        if let Some(pos) = self.pending.iter().position(|&qn| qn == query_number) {
            self.pending.remove(pos);
        }
    }

    pub fn assign(&mut self, query_number: u64, node_id: &str) {
        if let Some(query) = self.queries.get_mut(&query_number) {
            query.assigned_nodes.push(node_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_one_query() -> (QueryStore, u64) {
        let mut store = QueryStore::new();
        let qn = store.submit("submitter".into(), "hi".into(), QueryPolicy::default(), 0.0);
        (store, qn)
    }

    #[test]
    fn submit_assigns_strictly_increasing_numbers() {
        let mut store = QueryStore::new();
        let a = store.submit("s".into(), "q1".into(), QueryPolicy::default(), 0.0);
        let b = store.submit("s".into(), "q2".into(), QueryPolicy::default(), 1.0);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.pending(), &[1, 2]);
    }

    #[test]
    fn get_responses_unknown_query_is_empty_not_error() {
        let store = QueryStore::new();
        assert_eq!(store.get_responses(99, None).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn get_responses_rejects_non_submitter() {
        let (store, qn) = store_with_one_query();
        assert_eq!(
            store.get_responses(qn, Some("someone_else")),
            Err(StoreError::Unauthorized)
        );
        assert!(store.get_responses(qn, Some("submitter")).is_ok());
        assert!(store.get_responses(qn, None).is_ok());
    }

    #[test]
    fn append_response_rejects_self_response() {
        let (mut store, qn) = store_with_one_query();
        assert_eq!(
            store.append_response(qn, "submitter", "x".into(), 1.0),
            Err(StoreError::SelfResponseForbidden)
        );
    }

    #[test]
    fn append_response_rejects_unassigned_responder() {
        let (mut store, qn) = store_with_one_query();
        assert_eq!(
            store.append_response(qn, "stranger", "x".into(), 1.0),
            Err(StoreError::NotAssigned)
        );
    }

    #[test]
    fn append_response_rejects_duplicate() {
        let (mut store, qn) = store_with_one_query();
        store.assign(qn, "b");
        store.append_response(qn, "b", "first".into(), 1.0).unwrap();
        assert_eq!(
            store.append_response(qn, "b", "second".into(), 2.0),
            Err(StoreError::Duplicate)
        );
    }

    #[test]
    fn append_response_retires_pending_at_max_responses() {
        let mut store = QueryStore::new();
        let policy = QueryPolicy {
            max_responses: 2,
            timeout: 180.0,
        };
        let qn = store.submit("s".into(), "q".into(), policy, 0.0);
        store.assign(qn, "b");
        store.assign(qn, "c");

        store.append_response(qn, "b", "rb".into(), 1.0).unwrap();
        assert!(store.pending().contains(&qn));

        store.append_response(qn, "c", "rc".into(), 2.0).unwrap();
        assert!(!store.pending().contains(&qn));
    }

    #[test]
    fn end_is_soft_for_unknown_query() {
        let mut store = QueryStore::new();
        assert_eq!(store.end(42, None), Ok(false));
    }

    #[test]
    fn end_rejects_non_submitter() {
        let (mut store, qn) = store_with_one_query();
        assert_eq!(store.end(qn, Some("stranger")), Err(StoreError::Unauthorized));
        assert!(store.get(qn).is_some());
    }

    #[test]
    fn end_removes_query_and_pending_entry() {
        let (mut store, qn) = store_with_one_query();
        assert_eq!(store.end(qn, Some("submitter")), Ok(true));
        assert!(store.get(qn).is_none());
        assert!(!store.pending().contains(&qn));
    }

    #[test]
    fn expire_removes_only_timed_out_queries() {
        let mut store = QueryStore::new();
        let policy = QueryPolicy {
            max_responses: 3,
            timeout: 10.0,
        };
        let old = store.submit("s".into(), "old".into(), policy, 0.0);
        let fresh = store.submit("s".into(), "fresh".into(), policy, 9.0);

        let expired = store.expire(11.0);

        assert_eq!(expired, vec![old]);
        assert!(store.get(old).is_none());
        assert!(store.get(fresh).is_some());
        assert!(!store.pending().contains(&old));
        assert!(store.pending().contains(&fresh));
    }

    #[test]
    fn cap_drops_oldest_by_timestamp() {
        let mut store = QueryStore::new();
        let policy = QueryPolicy::default();
        let oldest = store.submit("s".into(), "a".into(), policy, 0.0);
        let middle = store.submit("s".into(), "b".into(), policy, 1.0);
        let newest = store.submit("s".into(), "c".into(), policy, 2.0);

        let dropped = store.cap(2);

        assert_eq!(dropped, vec![oldest]);
        assert!(store.get(oldest).is_none());
        assert!(store.get(middle).is_some());
        assert!(store.get(newest).is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn cap_is_noop_when_within_bounds() {
        let mut store = QueryStore::new();
        store.submit("s".into(), "a".into(), QueryPolicy::default(), 0.0);
        assert_eq!(store.cap(10), Vec::<u64>::new());
    }
}

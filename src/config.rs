//! Server configuration: CLI flags with environment-variable fallbacks,
//! mirroring the teacher's `Args` struct.

use clap::Parser;

/// Coordination server for a distributed pool of query-answering worker
/// nodes.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mesh-router",
    version,
    about = "Routes free-form text queries across a pool of polling worker nodes",
    long_about = None
)]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "API_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8313", env = "API_PORT")]
    pub port: u16,

    /// Maximum number of live queries a single node may be assigned at once
    #[arg(
        long,
        default_value = "5",
        env = "ROUTER_MAX_QUERIES_PER_NODE"
    )]
    pub max_queries_per_node: usize,

    /// Seconds of silence before a node is evicted
    #[arg(
        long,
        default_value = "300",
        env = "ROUTER_NODE_TIMEOUT_SECS"
    )]
    pub node_timeout_secs: u64,

    /// Seconds after submission before a query expires
    #[arg(
        long,
        default_value = "180",
        env = "ROUTER_QUERY_TIMEOUT_SECS"
    )]
    pub query_timeout_secs: u64,

    /// Responses collected before a query is retired from dispatch
    #[arg(
        long,
        default_value = "3",
        env = "ROUTER_MAX_RESPONSES_PER_QUERY"
    )]
    pub max_responses_per_query: usize,

    /// Maximum number of queries kept in memory at once
    #[arg(
        long,
        default_value = "1000",
        env = "ROUTER_MAX_MEMORY_SIZE"
    )]
    pub max_memory_size: usize,

    /// Seconds between reaper sweeps
    #[arg(
        long,
        default_value = "30",
        env = "ROUTER_SWEEP_INTERVAL_SECS"
    )]
    pub sweep_interval_secs: u64,

    /// Maximum queries returned per `/request` call
    #[arg(long, default_value = "3", env = "ROUTER_BATCH_CAP")]
    pub batch_cap: usize,

    /// Enable JSON logging format
    #[arg(long, env = "ROUTER_JSON_LOGS")]
    pub json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Config {
    /// A configuration with the spec's defaults, for use in unit and
    /// integration tests that don't go through CLI parsing.
    pub fn for_tests() -> Self {
        Self::parse_from(["mesh-router"])
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["mesh-router"])
    }
}

//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, Notify};

use crate::clock::Clock;
use crate::config::Config;
use crate::core::Core;

/// Application state shared across handlers.
///
/// `core` is the single global mutex the spec calls for: every mutation of
/// node/query/pending state goes through it, and no other lock is ever
/// taken while it is held.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<Mutex<Core>>,
    pub config: Arc<Config>,
    pub clock: Arc<Clock>,
    pub reaper_shutdown: Arc<Notify>,
    pub start_time: Instant,
    pub version: String,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            core: Arc::new(Mutex::new(Core::new())),
            config: Arc::new(config),
            clock: Arc::new(Clock::new()),
            reaper_shutdown: Arc::new(Notify::new()),
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

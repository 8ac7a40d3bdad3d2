//! Application state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::ApiConfig;
use crate::dispatch::JobDispatcher;
use crate::intake::Intake;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub intake: Intake,
    pub dispatcher: Arc<JobDispatcher>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let intake = Intake::new(config.upload_dir.clone());
        let dispatcher = JobDispatcher::new(&config, shutdown_rx);

        Self {
            config,
            intake,
            dispatcher: Arc::new(dispatcher),
            shutdown: Arc::new(shutdown_tx),
        }
    }

    /// Cancel every running job; used on server shutdown.
    pub fn cancel_jobs(&self) {
        self.shutdown.send_replace(true);
    }
}

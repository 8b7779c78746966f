//! Shared application state for the Axum API server.

use std::sync::Arc;

use herald_common::config::AppConfig;
use herald_engine::service::SchedulerService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<SchedulerService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(scheduler: Arc<SchedulerService>, config: AppConfig) -> Self {
        Self { scheduler, config }
    }
}

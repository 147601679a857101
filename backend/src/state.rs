//! Shared, read-only application state.
//!
//! Built once in `main` and registered as `web::Data<AppState>`. Handlers
//! clone the `Arc`s out of it when they hand work to the blocking pool.

use crate::config::AppConfig;
use crate::report::ReportPipeline;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<ReportPipeline>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: ReportPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}

//! Shared state for the HTTP API.

use crate::engine::QueryEngine;
use crate::index::IngestionPipeline;
use std::sync::Arc;
use std::time::Instant;

/// State shared across all API handlers.
pub struct ApiState {
    pub engine: Arc<QueryEngine>,
    pub pipeline: Arc<IngestionPipeline>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(engine: Arc<QueryEngine>, pipeline: Arc<IngestionPipeline>) -> Self {
        Self {
            engine,
            pipeline,
            started_at: Instant::now(),
        }
    }
}

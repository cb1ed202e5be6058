//! Progress reporting hooks for long-running stages

use crate::types::MergeAttempt;
use async_trait::async_trait;

/// Receives status updates while the pipeline runs
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// A free-form status line
    async fn on_message(&self, message: &str);

    /// A merge attempt finished
    async fn on_attempt(&self, attempt: &MergeAttempt) {
        let _ = attempt;
    }
}

/// Progress sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

#[async_trait]
impl ProgressCallback for NoProgress {
    async fn on_message(&self, _message: &str) {}
}

//! Batch inference
//!
//! Panels are independent, so a batch is split into contiguous chunks and each
//! chunk is evaluated on its own scoped thread against the shared engine.
//! Results come back in input order whatever the worker count.
//!
//! ```ignore
//! use it2fls::engine::BatchConfig;
//!
//! let config = BatchConfig::default().with_workers(4);
//! let results = engine.infer_batch(&panels, &config);
//! ```

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlsError, FlsResult};
use crate::report::RiskResult;

use super::{InferenceEngine, Panel};

/// Configuration for batch execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of worker threads (0 = auto-detect based on CPU count)
    pub workers: usize,
    /// Minimum panels per worker before parallelizing
    pub min_panels_per_worker: usize,
    /// Whether to enable parallel execution
    pub enabled: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            workers: 0,
            min_panels_per_worker: 32,
            enabled: true,
        }
    }
}

impl BatchConfig {
    /// Set number of worker threads
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn with_min_panels_per_worker(mut self, n: usize) -> Self {
        self.min_panels_per_worker = n;
        self
    }

    /// Disable parallel execution
    pub fn sequential(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Workers actually used for a batch of `panels`
    pub fn effective_workers(&self, panels: usize) -> usize {
        if !self.enabled {
            return 1;
        }
        let configured = if self.workers == 0 { num_cpus() } else { self.workers };
        let by_size = panels / self.min_panels_per_worker.max(1);
        configured.min(by_size).max(1)
    }
}

/// Get number of CPUs (fallback to 1 if detection fails)
fn num_cpus() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl InferenceEngine {
    /// Infer every panel, one result per panel in input order
    pub fn infer_batch(&self, panels: &[Panel], config: &BatchConfig) -> Vec<FlsResult<RiskResult>> {
        let workers = config.effective_workers(panels.len());
        if workers <= 1 {
            return panels.iter().map(|p| self.infer(p)).collect();
        }

        let chunk_size = panels.len().div_ceil(workers);
        debug!(panels = panels.len(), workers, chunk_size, "batch inference");

        thread::scope(|scope| {
            let handles: Vec<_> = panels
                .chunks(chunk_size)
                .map(|chunk| {
                    let handle = scope.spawn(move || chunk.iter().map(|p| self.infer(p)).collect::<Vec<_>>());
                    (chunk.len(), handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(len, handle)| match handle.join() {
                    Ok(results) => results,
                    Err(_) => (0..len)
                        .map(|_| Err(FlsError::internal("batch worker panicked")))
                        .collect(),
                })
                .collect()
        })
    }
}

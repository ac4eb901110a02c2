//! Org-wide analysis orchestration.
//!
//! Fans the device list out across a bounded number of concurrent device
//! pipelines. Two throttles compose here: the shared rate limiter bounds
//! raw request rate, while the governor semaphore bounds how many devices
//! are mid-flight at once so one device's eight requests cannot starve or
//! interleave unpredictably with dozens of others.

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::analysis::pipeline::DevicePipeline;
use crate::api::ApiError;
use crate::models::{DeviceResult, OrgResult, ProgressUpdate, Token};

/// Default device-level fan-out: fully serialized, since a single device
/// already issues up to eight requests against the shared bucket.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Drives one audit run across many devices.
pub struct OrgOrchestrator {
    pipeline: DevicePipeline,
    governor: Arc<Semaphore>,
}

impl OrgOrchestrator {
    pub fn new(pipeline: DevicePipeline, concurrency: usize) -> Self {
        Self {
            pipeline,
            governor: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Analyze every device, invoking `on_progress` as each one resolves.
    ///
    /// Devices complete in whatever order the scheduler yields; the result
    /// map is keyed by device id and order-insensitive. A pipeline fault
    /// that escapes per-kind containment is recorded as an all-failed
    /// entry, never dropped. Dropping the returned future cancels all
    /// outstanding work; devices never recorded were not attempted.
    pub async fn analyze_all(
        &self,
        devices: &[String],
        token: &Token,
        mut on_progress: impl FnMut(ProgressUpdate),
    ) -> OrgResult {
        let total = devices.len();
        info!(total, "Starting organization analysis");

        let mut tasks: FuturesUnordered<_> = devices
            .iter()
            .map(|device_id| self.analyze_governed(token, device_id))
            .collect();

        let mut org = OrgResult::new();
        let mut completed = 0usize;

        while let Some((device_id, result)) = tasks.next().await {
            org.record(device_id, result);
            completed += 1;
            on_progress(ProgressUpdate { completed, total });
        }

        info!(completed, "Organization analysis finished");
        org
    }

    async fn analyze_governed(&self, token: &Token, device_id: &str) -> (String, DeviceResult) {
        let _permit = self
            .governor
            .acquire()
            .await
            .expect("governor semaphore is never closed");

        let analysis = AssertUnwindSafe(self.pipeline.analyze(token, device_id));
        let result = match analysis.catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic_reason(&panic);
                warn!(device_id, reason, "Device pipeline panicked");
                DeviceResult::all_failed(&ApiError::Fault(reason.to_string()))
            }
        };

        (device_id.to_string(), result)
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

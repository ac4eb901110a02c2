//! Per-device analysis pipeline.
//!
//! Two phases, both internally parallel across the four analysis kinds:
//! submit every kind for one shared trailing window, then poll the result
//! endpoint for each submission that produced a usable handle. A failure in
//! one kind never blocks or aborts the other three; the returned map always
//! carries exactly one outcome per kind.

use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use crate::api::{ApiError, EyerisClient};
use crate::models::{
    AnalysisKind, AnalysisOutcome, AnalysisWindow, DeviceResult, JobHandle, Token,
};

/// Runs the submit/poll protocol for a single device.
pub struct DevicePipeline {
    client: Arc<EyerisClient>,
    window_hours: i64,
}

impl DevicePipeline {
    pub fn new(client: Arc<EyerisClient>, window_hours: i64) -> Self {
        Self {
            client,
            window_hours,
        }
    }

    /// Analyze one device across all four kinds.
    ///
    /// The window is computed once so every kind shares identical bounds.
    /// Never fails as a whole: per-kind errors land in the result map.
    pub async fn analyze(&self, token: &Token, device_id: &str) -> DeviceResult {
        let window = AnalysisWindow::trailing_hours(self.window_hours);
        let mut result = DeviceResult::new();

        debug!(device_id, from = window.from, to = window.to, "Submitting analyses");

        let submissions = join_all(AnalysisKind::ALL.map(|kind| {
            let window = window;
            async move {
                let submitted = self
                    .client
                    .submit_analysis(token, device_id, kind, &window)
                    .await;
                (kind, submitted)
            }
        }))
        .await;

        // A submission missing either correlation id never reaches the
        // poll phase
        let mut handles: Vec<(AnalysisKind, JobHandle)> = Vec::new();
        for (kind, submitted) in submissions {
            match submitted {
                Ok(response) => match response.into_handle() {
                    Some(handle) => handles.push((kind, handle)),
                    None => result.record(
                        kind,
                        AnalysisOutcome::Failure(ApiError::InvalidAnalysisResponse),
                    ),
                },
                Err(err) => result.record(kind, AnalysisOutcome::Failure(err)),
            }
        }

        let polled = join_all(handles.into_iter().map(|(kind, handle)| async move {
            let payload = self.client.fetch_analysis_result(token, &handle).await;
            (kind, payload)
        }))
        .await;

        for (kind, payload) in polled {
            match payload {
                Ok(payload) => result.record(kind, AnalysisOutcome::Success(payload)),
                Err(err) => result.record(kind, AnalysisOutcome::Failure(err)),
            }
        }

        debug!(
            device_id,
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "Device analysis complete"
        );

        result
    }
}

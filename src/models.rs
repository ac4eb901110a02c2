//! Data models for the device auditor.
//!
//! This module contains the core data structures used throughout the
//! application: analysis kinds, device records, job correlation handles,
//! and the per-device / org-wide result maps.

use chrono::{DateTime, Duration, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::ApiError;

/// One of the four fixed device-health dimensions evaluated per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    Roaming,
    Coverage,
    Congestion,
    Interference,
}

impl AnalysisKind {
    /// All four kinds, in submission order.
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::Roaming,
        AnalysisKind::Coverage,
        AnalysisKind::Congestion,
        AnalysisKind::Interference,
    ];

    /// The upper-cased `type` value the submission endpoint expects.
    pub fn api_type(&self) -> &'static str {
        match self {
            AnalysisKind::Roaming => "ROAMING",
            AnalysisKind::Coverage => "COVERAGE",
            AnalysisKind::Congestion => "CONGESTION",
            AnalysisKind::Interference => "INTERFERENCE",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Roaming => write!(f, "Roaming"),
            AnalysisKind::Coverage => write!(f, "Coverage"),
            AnalysisKind::Congestion => write!(f, "Congestion"),
            AnalysisKind::Interference => write!(f, "Interference"),
        }
    }
}

/// Opaque bearer credential for the Eyeris API.
///
/// Supplied once per run and held read-only; expiry is the identity
/// provider's concern, not ours.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log credential material
        write!(f, "Token(***)")
    }
}

/// A monitored device as returned by the agents inventory endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_licensed: bool,
    /// Epoch milliseconds of the last test observed on this device.
    #[serde(default)]
    pub last_test_seen: Option<i64>,
}

/// Envelope for the agents listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsResponse {
    #[serde(default)]
    pub results: Vec<AgentRecord>,
}

/// The trailing time window shared by all four submissions for one device.
///
/// Both bounds are epoch milliseconds; the API wants them as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub from: i64,
    pub to: i64,
}

impl AnalysisWindow {
    /// Compute the trailing window ending now.
    ///
    /// "Now" is sampled exactly once so every kind submitted for the same
    /// device shares identical bounds.
    pub fn trailing_hours(hours: i64) -> Self {
        Self::ending_at(Utc::now(), hours)
    }

    /// Trailing window ending at an explicit instant.
    pub fn ending_at(end: DateTime<Utc>, hours: i64) -> Self {
        let to = end.timestamp_millis();
        let from = (end - Duration::hours(hours)).timestamp_millis();
        Self { from, to }
    }

    pub fn from_param(&self) -> String {
        self.from.to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.to_string()
    }
}

/// Raw submission response; either id may be missing on a malformed reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub request_queue_id: Option<String>,
}

impl SubmissionResponse {
    /// Promote to a poll handle, or `None` when either id is absent.
    pub fn into_handle(self) -> Option<JobHandle> {
        match (self.request_id, self.request_queue_id) {
            (Some(request_id), Some(request_queue_id)) => Some(JobHandle {
                request_id,
                request_queue_id,
            }),
            _ => None,
        }
    }
}

/// Correlation pair returned by a successful submission.
///
/// Usable exactly once, to retrieve the one job it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub request_id: String,
    pub request_queue_id: String,
}

/// Completed analysis payload.
///
/// The `response` field is free text produced by the Eyeris AI backend; the
/// orchestrator treats it as opaque. Structuring it is the report layer's
/// concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default)]
    pub response: String,
}

/// Tagged result for one (device, kind) pair.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Success(AnalysisPayload),
    Failure(ApiError),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&AnalysisPayload> {
        match self {
            AnalysisOutcome::Success(payload) => Some(payload),
            AnalysisOutcome::Failure(_) => None,
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Failure(err) => Some(err.to_string()),
        }
    }
}

impl Serialize for AnalysisOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisOutcome::Success(payload) => {
                let mut s = serializer.serialize_struct("AnalysisOutcome", 2)?;
                s.serialize_field("status", "success")?;
                s.serialize_field("payload", payload)?;
                s.end()
            }
            AnalysisOutcome::Failure(err) => {
                let mut s = serializer.serialize_struct("AnalysisOutcome", 2)?;
                s.serialize_field("status", "failure")?;
                s.serialize_field("reason", &err.to_string())?;
                s.end()
            }
        }
    }
}

/// Per-device result map: one entry per analysis kind, always four once the
/// pipeline completes.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DeviceResult {
    outcomes: BTreeMap<AnalysisKind, AnalysisOutcome>,
}

impl DeviceResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize a result with every kind marked failed.
    ///
    /// Used when a pipeline fault escapes per-kind containment; callers can
    /// still tell "tried and failed" apart from "never attempted".
    pub fn all_failed(error: &ApiError) -> Self {
        let mut result = Self::new();
        for kind in AnalysisKind::ALL {
            result.record(kind, AnalysisOutcome::Failure(error.clone()));
        }
        result
    }

    pub fn record(&mut self, kind: AnalysisKind, outcome: AnalysisOutcome) {
        self.outcomes.insert(kind, outcome);
    }

    pub fn get(&self, kind: AnalysisKind) -> Option<&AnalysisOutcome> {
        self.outcomes.get(&kind)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (AnalysisKind, &AnalysisOutcome)> {
        self.outcomes.iter().map(|(kind, outcome)| (*kind, outcome))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True once every analysis kind has an outcome recorded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == AnalysisKind::ALL.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

/// Org-wide result map keyed by device id.
///
/// Built incrementally as device pipelines complete; partial by design when
/// a run is cancelled mid-flight.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OrgResult {
    devices: BTreeMap<String, DeviceResult>,
}

impl OrgResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, device_id: impl Into<String>, result: DeviceResult) {
        self.devices.insert(device_id.into(), result);
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceResult> {
        self.devices.get(device_id)
    }

    pub fn devices(&self) -> impl Iterator<Item = (&String, &DeviceResult)> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Progress notification emitted after each device resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
}

impl ProgressUpdate {
    /// Completed fraction in [0, 1]; monotone over a run and exactly 1.0
    /// once every device has resolved.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Metadata about an audit run, embedded in generated reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Base URL of the analyzed API environment.
    pub api_url: String,
    /// Date and time the analysis finished.
    pub analysis_date: DateTime<Utc>,
    /// Number of devices analyzed.
    pub devices_analyzed: usize,
    /// Number of devices with at least one issue or failed analysis.
    pub devices_non_compliant: usize,
    /// Total failed (device, kind) analyses.
    pub analyses_failed: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_api_type() {
        assert_eq!(AnalysisKind::Roaming.api_type(), "ROAMING");
        assert_eq!(AnalysisKind::Interference.api_type(), "INTERFERENCE");
        assert_eq!(AnalysisKind::ALL.len(), 4);
    }

    #[test]
    fn test_window_span() {
        let end = Utc::now();
        let window = AnalysisWindow::ending_at(end, 2);
        assert_eq!(window.to - window.from, 2 * 3_600_000);
        assert_eq!(window.to_param(), window.to.to_string());
    }

    #[test]
    fn test_submission_into_handle() {
        let complete = SubmissionResponse {
            request_id: Some("r1".to_string()),
            request_queue_id: Some("q1".to_string()),
        };
        let handle = complete.into_handle().unwrap();
        assert_eq!(handle.request_id, "r1");
        assert_eq!(handle.request_queue_id, "q1");

        let missing_queue = SubmissionResponse {
            request_id: Some("r1".to_string()),
            request_queue_id: None,
        };
        assert!(missing_queue.into_handle().is_none());

        let empty = SubmissionResponse {
            request_id: None,
            request_queue_id: None,
        };
        assert!(empty.into_handle().is_none());
    }

    #[test]
    fn test_device_result_all_failed() {
        let result = DeviceResult::all_failed(&ApiError::RetriesExhausted);
        assert!(result.is_complete());
        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 4);
        let reason = result
            .get(AnalysisKind::Coverage)
            .and_then(|o| o.failure_reason())
            .unwrap();
        assert_eq!(reason, "Max retries reached");
    }

    #[test]
    fn test_org_result_record() {
        let mut org = OrgResult::new();
        let mut device = DeviceResult::new();
        device.record(
            AnalysisKind::Roaming,
            AnalysisOutcome::Success(AnalysisPayload {
                response: "Number of Issues: 0".to_string(),
            }),
        );
        org.record("dev-1", device);

        assert_eq!(org.len(), 1);
        assert!(org.get("dev-1").is_some());
        assert!(org.get("dev-2").is_none());
    }

    #[test]
    fn test_progress_fraction() {
        let halfway = ProgressUpdate {
            completed: 1,
            total: 2,
        };
        assert_eq!(halfway.fraction(), 0.5);

        let done = ProgressUpdate {
            completed: 2,
            total: 2,
        };
        assert_eq!(done.fraction(), 1.0);

        let empty = ProgressUpdate {
            completed: 0,
            total: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn test_outcome_serialization() {
        let success = AnalysisOutcome::Success(AnalysisPayload {
            response: "ok".to_string(),
        });
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["payload"]["response"], "ok");

        let failure = AnalysisOutcome::Failure(ApiError::InvalidAnalysisResponse);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "Invalid analysis response");
    }
}

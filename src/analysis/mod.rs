//! Device analysis orchestration.
//!
//! The per-device submit/poll pipeline and the org-wide governed fan-out
//! that drives it.

pub mod orchestrator;
pub mod pipeline;

pub use orchestrator::OrgOrchestrator;
pub use pipeline::DevicePipeline;

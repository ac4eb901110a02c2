//! Report generation.
//!
//! Digests opaque analysis payloads into findings and renders them as
//! Markdown, JSON, or the HTML dashboard.

pub mod dashboard;
pub mod digest;
pub mod generator;

pub use dashboard::generate_html_dashboard;
pub use generator::{
    digest_org, generate_json_report, generate_markdown_report, ComplianceSummary, DeviceFindings,
};

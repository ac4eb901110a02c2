//! Markdown and JSON report generation.
//!
//! Turns an `OrgResult` into the human-facing audit report: compliance
//! summary, per-device findings, deduplicated recommendations.

use anyhow::Result;
use serde::Serialize;

use crate::devices::SelectedDevice;
use crate::models::{AnalysisKind, AnalysisOutcome, DeviceResult, OrgResult, ReportMetadata};
use crate::report::digest::ResponseDigest;

/// How many recommendations to keep per side after deduplication.
const MAX_RECOMMENDATIONS: usize = 3;

/// Digested verdict for one (device, kind) pair.
#[derive(Debug, Clone)]
pub enum Finding {
    /// Analysis succeeded, no issues reported.
    Healthy(ResponseDigest),
    /// Analysis succeeded and reported at least one issue.
    Issue(ResponseDigest),
    /// Analysis failed; the reason is the coarse failure string.
    Failed(String),
}

/// All findings for one device, in kind order.
#[derive(Debug, Clone)]
pub struct DeviceFindings {
    pub device: SelectedDevice,
    pub findings: Vec<(AnalysisKind, Finding)>,
}

impl DeviceFindings {
    /// Compliant means four successful analyses and zero reported issues.
    pub fn is_compliant(&self) -> bool {
        self.findings
            .iter()
            .all(|(_, finding)| matches!(finding, Finding::Healthy(_)))
    }

    pub fn issue_count(&self) -> u32 {
        self.findings
            .iter()
            .map(|(_, finding)| match finding {
                Finding::Issue(digest) => digest.issue_count,
                _ => 0,
            })
            .sum()
    }

    pub fn failure_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|(_, finding)| matches!(finding, Finding::Failed(_)))
            .count()
    }

    /// One line per problem, as shown on the dashboard.
    pub fn issue_lines(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter_map(|(kind, finding)| match finding {
                Finding::Healthy(_) => None,
                Finding::Issue(digest) => Some(format!(
                    "{kind}: {}",
                    digest.main_issue.as_deref().unwrap_or("N/A")
                )),
                Finding::Failed(reason) => {
                    Some(format!("{kind}: Failed to retrieve data ({reason})"))
                }
            })
            .collect()
    }
}

/// Digest one device's raw outcomes.
pub fn digest_device(device: &SelectedDevice, result: &DeviceResult) -> DeviceFindings {
    let findings = result
        .outcomes()
        .map(|(kind, outcome)| {
            let finding = match outcome {
                AnalysisOutcome::Success(payload) => {
                    let digest = ResponseDigest::parse(kind, &payload.response);
                    if digest.has_issues() {
                        Finding::Issue(digest)
                    } else {
                        Finding::Healthy(digest)
                    }
                }
                AnalysisOutcome::Failure(err) => Finding::Failed(err.to_string()),
            };
            (kind, finding)
        })
        .collect();

    DeviceFindings {
        device: device.clone(),
        findings,
    }
}

/// Digest every recorded device, in the order they were selected.
pub fn digest_org(devices: &[SelectedDevice], org: &OrgResult) -> Vec<DeviceFindings> {
    devices
        .iter()
        .filter_map(|device| org.get(&device.id).map(|result| digest_device(device, result)))
        .collect()
}

/// Org-wide compliance counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceSummary {
    pub total: usize,
    pub compliant: usize,
    pub with_issues: usize,
    pub with_failures: usize,
    pub analyses_failed: usize,
    pub total_issues: u32,
}

impl ComplianceSummary {
    pub fn from_findings(findings: &[DeviceFindings]) -> Self {
        let mut summary = Self {
            total: findings.len(),
            ..Self::default()
        };

        for device in findings {
            if device.is_compliant() {
                summary.compliant += 1;
            }
            if device.issue_count() > 0 {
                summary.with_issues += 1;
            }
            if device.failure_count() > 0 {
                summary.with_failures += 1;
            }
            summary.analyses_failed += device.failure_count();
            summary.total_issues += device.issue_count();
        }

        summary
    }

    pub fn non_compliant(&self) -> usize {
        self.total - self.compliant
    }
}

/// Generate the complete Markdown report.
pub fn generate_markdown_report(
    metadata: &ReportMetadata,
    findings: &[DeviceFindings],
) -> String {
    let mut output = String::new();

    output.push_str("# NetAuditor Report\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_summary_section(findings));
    output.push_str(&generate_devices_section(findings));
    output.push_str(&generate_recommendations_section(findings));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **API Environment:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Devices Analyzed:** {}\n",
        metadata.devices_analyzed
    ));
    if metadata.devices_non_compliant > 0 {
        section.push_str(&format!(
            "- **Non-Compliant Devices:** {}\n",
            metadata.devices_non_compliant
        ));
    }
    if metadata.analyses_failed > 0 {
        section.push_str(&format!(
            "- **Failed Analyses:** {}\n",
            metadata.analyses_failed
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_summary_section(findings: &[DeviceFindings]) -> String {
    let summary = ComplianceSummary::from_findings(findings);
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| ✅ Compliant | ⚠️ With Issues | ❌ With Failures | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.compliant, summary.with_issues, summary.with_failures, summary.total
    ));

    if summary.total_issues > 0 {
        section.push_str(&format!(
            "{} issue(s) reported across the organization.\n\n",
            summary.total_issues
        ));
    } else if summary.analyses_failed == 0 {
        section.push_str(
            "All devices are performing well with 100% SLA compliance across all analyses.\n\n",
        );
    }

    section
}

fn generate_devices_section(findings: &[DeviceFindings]) -> String {
    let mut section = String::new();

    section.push_str("## Devices\n\n");

    for device in findings {
        section.push_str(&format!("### {}\n\n", device.device.label()));

        for (kind, finding) in &device.findings {
            match finding {
                Finding::Healthy(_) => {
                    section.push_str(&format!(
                        "- ✅ **{kind}:** No significant issues (100% SLA compliance)\n"
                    ));
                }
                Finding::Issue(digest) => {
                    section.push_str(&format!("- ⚠️ **{kind}:** {}\n", digest.headline()));
                    for metric in &digest.metrics {
                        section.push_str(&format!("  - {metric}\n"));
                    }
                }
                Finding::Failed(reason) => {
                    section.push_str(&format!(
                        "- ❌ **{kind}:** Failed to retrieve data ({reason})\n"
                    ));
                }
            }
        }
        section.push('\n');
    }

    section
}

fn generate_recommendations_section(findings: &[DeviceFindings]) -> String {
    let mut device_fixes: Vec<String> = Vec::new();
    let mut network_fixes: Vec<String> = Vec::new();

    for device in findings {
        for (_, finding) in &device.findings {
            if let Finding::Issue(digest) = finding {
                device_fixes.extend(digest.device_fixes.iter().cloned());
                network_fixes.extend(digest.network_fixes.iter().cloned());
            }
        }
    }

    let device_fixes = dedup_capped(device_fixes);
    let network_fixes = dedup_capped(network_fixes);

    if device_fixes.is_empty() && network_fixes.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Recommended Actions\n\n");

    if !device_fixes.is_empty() {
        section.push_str("**Device-Side**\n\n");
        for fix in &device_fixes {
            section.push_str(&format!("- {fix}\n"));
        }
        section.push('\n');
    }
    if !network_fixes.is_empty() {
        section.push_str("**Network-Side**\n\n");
        for fix in &network_fixes {
            section.push_str(&format!("- {fix}\n"));
        }
        section.push('\n');
    }

    section
}

/// First-seen deduplication, capped to keep the report actionable.
fn dedup_capped(fixes: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    fixes
        .into_iter()
        .filter(|fix| seen.insert(fix.clone()))
        .take(MAX_RECOMMENDATIONS)
        .collect()
}

fn generate_footer() -> String {
    "---\n\n*Report generated by NetAuditor*\n".to_string()
}

#[derive(Serialize)]
struct JsonDevice<'a> {
    id: &'a str,
    label: String,
    outcomes: &'a DeviceResult,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    summary: ComplianceSummary,
    devices: Vec<JsonDevice<'a>>,
}

/// Generate the JSON report.
pub fn generate_json_report(
    metadata: &ReportMetadata,
    devices: &[SelectedDevice],
    org: &OrgResult,
) -> Result<String> {
    let findings = digest_org(devices, org);
    let report = JsonReport {
        metadata,
        summary: ComplianceSummary::from_findings(&findings),
        devices: devices
            .iter()
            .filter_map(|device| {
                org.get(&device.id).map(|outcomes| JsonDevice {
                    id: &device.id,
                    label: device.label(),
                    outcomes,
                })
            })
            .collect(),
    };

    serde_json::to_string_pretty(&report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::AnalysisPayload;
    use chrono::Utc;

    fn device(id: &str) -> SelectedDevice {
        SelectedDevice {
            id: id.to_string(),
            name: Some(format!("ap-{id}")),
            nickname: None,
        }
    }

    fn success(response: &str) -> AnalysisOutcome {
        AnalysisOutcome::Success(AnalysisPayload {
            response: response.to_string(),
        })
    }

    fn sample_org() -> (Vec<SelectedDevice>, OrgResult) {
        let mut clean = DeviceResult::new();
        for kind in AnalysisKind::ALL {
            clean.record(kind, success("Number of Issues: 0"));
        }

        let mut flaky = DeviceResult::new();
        flaky.record(
            AnalysisKind::Roaming,
            success("Number of Issues: 2\nMain Issue: Excessive roaming events\nTotal Impact: 12 min\n"),
        );
        flaky.record(AnalysisKind::Coverage, success("Number of Issues: 0"));
        flaky.record(
            AnalysisKind::Congestion,
            AnalysisOutcome::Failure(ApiError::RetriesExhausted),
        );
        flaky.record(AnalysisKind::Interference, success("Number of Issues: 0"));

        let mut org = OrgResult::new();
        org.record("d1", clean);
        org.record("d2", flaky);

        (vec![device("d1"), device("d2")], org)
    }

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            api_url: "https://api-v2.7signal.com".to_string(),
            analysis_date: Utc::now(),
            devices_analyzed: 2,
            devices_non_compliant: 1,
            analyses_failed: 1,
            duration_seconds: 42.0,
        }
    }

    #[test]
    fn test_compliance_summary() {
        let (devices, org) = sample_org();
        let findings = digest_org(&devices, &org);
        let summary = ComplianceSummary::from_findings(&findings);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.compliant, 1);
        assert_eq!(summary.with_issues, 1);
        assert_eq!(summary.with_failures, 1);
        assert_eq!(summary.analyses_failed, 1);
        assert_eq!(summary.total_issues, 2);
        assert_eq!(summary.non_compliant(), 1);
    }

    #[test]
    fn test_issue_lines() {
        let (devices, org) = sample_org();
        let findings = digest_org(&devices, &org);

        assert!(findings[0].issue_lines().is_empty());

        let lines = findings[1].issue_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"Roaming: Excessive roaming events".to_string()));
        assert!(lines
            .contains(&"Congestion: Failed to retrieve data (Max retries reached)".to_string()));
    }

    #[test]
    fn test_markdown_report_sections() {
        let (devices, org) = sample_org();
        let findings = digest_org(&devices, &org);
        let markdown = generate_markdown_report(&metadata(), &findings);

        assert!(markdown.contains("# NetAuditor Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("### ap-d1 (ID: d1)"));
        assert!(markdown.contains("Excessive roaming events"));
        assert!(markdown.contains("Failed to retrieve data (Max retries reached)"));
    }

    #[test]
    fn test_recommendations_deduplicated_and_capped() {
        let response = "Number of Issues: 1\nMain Issue: Congested channel\n\
            Device-side fixes recommended:\n- Fix A\n- Fix A\n- Fix B\n- Fix C\n- Fix D\n";
        let mut result = DeviceResult::new();
        result.record(AnalysisKind::Congestion, success(response));
        for kind in [
            AnalysisKind::Roaming,
            AnalysisKind::Coverage,
            AnalysisKind::Interference,
        ] {
            result.record(kind, success("Number of Issues: 0"));
        }

        let mut org = OrgResult::new();
        org.record("d1", result);
        let devices = vec![device("d1")];
        let findings = digest_org(&devices, &org);

        let markdown = generate_markdown_report(&metadata(), &findings);
        assert!(markdown.contains("## Recommended Actions"));
        assert!(markdown.contains("- Fix A\n"));
        assert!(markdown.contains("- Fix C\n"));
        // Deduped to A, B, C and capped at three
        assert!(!markdown.contains("- Fix D"));
        assert_eq!(markdown.matches("- Fix A").count(), 1);
    }

    #[test]
    fn test_json_report_shape() {
        let (devices, org) = sample_org();
        let json = generate_json_report(&metadata(), &devices, &org).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["devices"][0]["id"], "d1");
        assert_eq!(
            value["devices"][1]["outcomes"]["Congestion"]["status"],
            "failure"
        );
        assert_eq!(
            value["devices"][1]["outcomes"]["Roaming"]["status"],
            "success"
        );
    }
}

//! Extraction of findings from free-text analysis responses.
//!
//! The analysis backend answers in prose with a loosely stable shape
//! ("Number of Issues: N", "Main Issue: ...", fix lists). The orchestrator
//! hands that text through untouched; this module is the only place it is
//! pattern-matched into something structured.

use regex::Regex;

use crate::models::AnalysisKind;

fn pattern(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// Structured digest of one analysis response.
#[derive(Debug, Clone, Default)]
pub struct ResponseDigest {
    pub issue_count: u32,
    pub main_issue: Option<String>,
    pub major_issues: Option<String>,
    pub total_impact: Option<String>,
    pub metrics: Vec<String>,
    pub device_fixes: Vec<String>,
    pub network_fixes: Vec<String>,
}

impl ResponseDigest {
    /// Parse the response text for one analysis kind.
    pub fn parse(kind: AnalysisKind, response: &str) -> Self {
        let issue_count = pattern(r"Number of Issues: (\d+)")
            .captures(response)
            .and_then(|c| c[1].parse().ok())
            .unwrap_or(0);

        Self {
            issue_count,
            main_issue: capture_line(response, r"(?m)Main Issue: (.*)$"),
            major_issues: capture_line(response, r"(?m)Major Issues: (.*)$"),
            total_impact: capture_line(response, r"(?m)Total Impact: (.*)$"),
            metrics: metric_lines(kind, response),
            device_fixes: fix_list(
                response,
                r"(?s)Device-side fixes[^:]*:(.*?)(?:Network-side fixes|Note:|\z)",
            ),
            network_fixes: fix_list(
                response,
                r"(?s)Network-side fixes[^:]*:(.*?)(?:Device-side fixes|Note:|\z)",
            ),
        }
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count > 0
    }

    /// One-line verdict for summaries and the dashboard.
    pub fn headline(&self) -> String {
        if self.has_issues() {
            format!(
                "{} (Impact: {})",
                self.main_issue.as_deref().unwrap_or("N/A"),
                self.total_impact.as_deref().unwrap_or("N/A"),
            )
        } else {
            "No significant issues (100% SLA compliance)".to_string()
        }
    }
}

fn capture_line(response: &str, regex: &str) -> Option<String> {
    pattern(regex)
        .captures(response)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Kind-specific metric lines quoted verbatim from the response.
fn metric_lines(kind: AnalysisKind, response: &str) -> Vec<String> {
    let regex = match kind {
        AnalysisKind::Roaming => {
            r"(?m)Channel utilization.*$|Signal strength.*?dBm|Client counts.*$"
        }
        AnalysisKind::Coverage => r"(?m)Signal strength.*?dBm|7MCS values.*?[,.]|7MCS values.*$",
        AnalysisKind::Congestion => {
            r"(?m)Channel utilization.*?[,.]|Signal strength.*?dBm|Client counts.*$"
        }
        AnalysisKind::Interference => {
            r"(?m)Co-Channel Interference.*?[,.]|Channel utilization.*?[,.]|Signal strength.*?dBm"
        }
    };

    pattern(regex)
        .find_iter(response)
        .map(|m| m.as_str().trim().trim_end_matches([',', '.']).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a captured fix block into its non-empty lines.
fn fix_list(response: &str, regex: &str) -> Vec<String> {
    pattern(regex)
        .captures(response)
        .map(|c| {
            c[1].lines()
                .map(|line| line.trim().trim_start_matches(['-', '*']).trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

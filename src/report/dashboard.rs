//! HTML dashboard generation.
//!
//! Single-page Tailwind dashboard highlighting non-compliant devices,
//! written when the html output format is selected.

use crate::report::generator::DeviceFindings;

const DASHBOARD_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>7SIGNAL Eyeris Non-Compliant Devices Dashboard</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100 font-sans">
    <div class="container mx-auto p-4">
        <h1 class="text-3xl font-bold text-center text-gray-800 mb-6">7SIGNAL Eyeris Non-Compliant Devices</h1>
        <div class="bg-white shadow-md rounded-lg p-6">
            <h2 class="text-xl font-semibold text-gray-700 mb-4">Devices with Issues</h2>
            <div class="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-3 gap-4">
"#;

const DASHBOARD_TAIL: &str = r#"            </div>
        </div>
    </div>
</body>
</html>
"#;

const ALL_COMPLIANT_CARD: &str = r#"                <div class="bg-green-50 p-4 rounded-lg shadow">
                    <h3 class="text-lg font-medium text-green-800">All Devices Compliant</h3>
                    <p class="text-gray-700">All devices are performing well with 100% SLA compliance across all analyses.</p>
                </div>
"#;

/// Render the dashboard for a completed run.
pub fn generate_html_dashboard(findings: &[DeviceFindings]) -> String {
    let mut html = String::from(DASHBOARD_HEAD);

    let non_compliant: Vec<&DeviceFindings> = findings
        .iter()
        .filter(|device| !device.is_compliant())
        .collect();

    if non_compliant.is_empty() {
        html.push_str(ALL_COMPLIANT_CARD);
    } else {
        for device in non_compliant {
            html.push_str(&device_card(device));
        }
    }

    html.push_str(DASHBOARD_TAIL);
    html
}

fn device_card(device: &DeviceFindings) -> String {
    let mut card = String::new();

    card.push_str("                <div class=\"bg-red-50 p-4 rounded-lg shadow\">\n");
    card.push_str(&format!(
        "                    <h3 class=\"text-lg font-medium text-red-800\">{}</h3>\n",
        escape(&device.device.label())
    ));
    card.push_str("                    <ul class=\"list-disc list-inside text-gray-700\">\n");
    for line in device.issue_lines() {
        card.push_str(&format!("                        <li>{}</li>\n", escape(&line)));
    }
    card.push_str("                    </ul>\n");
    card.push_str("                </div>\n");

    card
}

/// Minimal HTML escaping for text sourced from API responses.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::SelectedDevice;
    use crate::models::{AnalysisKind, AnalysisOutcome, AnalysisPayload, DeviceResult, OrgResult};
    use crate::report::generator::digest_org;

    fn org_with(response: &str) -> (Vec<SelectedDevice>, OrgResult) {
        let mut result = DeviceResult::new();
        for kind in AnalysisKind::ALL {
            result.record(
                kind,
                AnalysisOutcome::Success(AnalysisPayload {
                    response: response.to_string(),
                }),
            );
        }
        let mut org = OrgResult::new();
        org.record("d1", result);

        let devices = vec![SelectedDevice {
            id: "d1".to_string(),
            name: Some("ap-lobby".to_string()),
            nickname: None,
        }];
        (devices, org)
    }

    #[test]
    fn test_all_compliant_card() {
        let (devices, org) = org_with("Number of Issues: 0");
        let findings = digest_org(&devices, &org);
        let html = generate_html_dashboard(&findings);

        assert!(html.contains("All Devices Compliant"));
        assert!(!html.contains("bg-red-50"));
    }

    #[test]
    fn test_non_compliant_device_card() {
        let (devices, org) =
            org_with("Number of Issues: 1\nMain Issue: Co-channel interference\n");
        let findings = digest_org(&devices, &org);
        let html = generate_html_dashboard(&findings);

        assert!(html.contains("ap-lobby (ID: d1)"));
        assert!(html.contains("Co-channel interference"));
        assert!(!html.contains("All Devices Compliant"));
    }

    #[test]
    fn test_response_text_is_escaped() {
        let (devices, org) =
            org_with("Number of Issues: 1\nMain Issue: <script>alert(1)</script>\n");
        let findings = digest_org(&devices, &org);
        let html = generate_html_dashboard(&findings);

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
    }
}

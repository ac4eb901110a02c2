//! Device selection from the agents inventory.
//!
//! The orchestrator analyzes whatever device ids it is handed; choosing
//! those devices (license state, test recency, explicit ids) happens here.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::models::AgentRecord;

/// Filter applied to the inventory before analysis.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    /// Keep only licensed devices.
    pub licensed_only: bool,
    /// Keep only devices whose last test falls on the current UTC day.
    pub seen_today: bool,
    /// Explicit device ids to keep; empty means no restriction.
    pub ids: Vec<String>,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            licensed_only: true,
            seen_today: false,
            ids: Vec::new(),
        }
    }
}

/// A device chosen for analysis, with enough identity for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDevice {
    pub id: String,
    pub name: Option<String>,
    pub nickname: Option<String>,
}

impl SelectedDevice {
    /// Human-facing label: nickname when set, else name, with the id
    /// appended for disambiguation.
    pub fn label(&self) -> String {
        let base = self
            .nickname
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("N/A");
        format!("{} (ID: {})", base, self.id)
    }
}

impl From<&AgentRecord> for SelectedDevice {
    fn from(agent: &AgentRecord) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            nickname: agent.nickname.clone(),
        }
    }
}

/// Apply the filter against the inventory, evaluated at the current time.
pub fn select_devices(agents: &[AgentRecord], filter: &DeviceFilter) -> Vec<SelectedDevice> {
    select_devices_at(agents, filter, Utc::now())
}

/// Filter with an explicit "now" for the recency check.
pub fn select_devices_at(
    agents: &[AgentRecord],
    filter: &DeviceFilter,
    now: DateTime<Utc>,
) -> Vec<SelectedDevice> {
    let today = now.date_naive();

    let selected: Vec<SelectedDevice> = agents
        .iter()
        .filter(|agent| !filter.licensed_only || agent.is_licensed)
        .filter(|agent| {
            if !filter.seen_today {
                return true;
            }
            agent
                .last_test_seen
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                .map(|seen| seen.date_naive() == today)
                .unwrap_or(false)
        })
        .filter(|agent| filter.ids.is_empty() || filter.ids.iter().any(|id| *id == agent.id))
        .map(SelectedDevice::from)
        .collect();

    debug!(
        total = agents.len(),
        selected = selected.len(),
        "Filtered device inventory"
    );

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, licensed: bool, last_test_seen: Option<i64>) -> AgentRecord {
        AgentRecord {
            id: id.to_string(),
            name: Some(format!("name-{id}")),
            nickname: None,
            is_licensed: licensed,
            last_test_seen,
        }
    }

    #[test]
    fn test_licensed_only_filter() {
        let agents = vec![agent("a", true, None), agent("b", false, None)];

        let selected = select_devices(&agents, &DeviceFilter::default());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "a");

        let all = select_devices(
            &agents,
            &DeviceFilter {
                licensed_only: false,
                ..DeviceFilter::default()
            },
        );
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_seen_today_filter() {
        let now = Utc::now();
        let this_morning = now.timestamp_millis() - 60_000;
        let last_week = now.timestamp_millis() - 7 * 24 * 3_600_000;

        let agents = vec![
            agent("fresh", true, Some(this_morning)),
            agent("stale", true, Some(last_week)),
            agent("never", true, None),
        ];
        let filter = DeviceFilter {
            seen_today: true,
            ..DeviceFilter::default()
        };

        let selected = select_devices_at(&agents, &filter, now);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "fresh");
    }

    #[test]
    fn test_explicit_ids() {
        let agents = vec![
            agent("a", true, None),
            agent("b", true, None),
            agent("c", true, None),
        ];
        let filter = DeviceFilter {
            ids: vec!["b".to_string(), "c".to_string()],
            ..DeviceFilter::default()
        };

        let selected = select_devices(&agents, &filter);
        let ids: Vec<&str> = selected.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_label_prefers_nickname() {
        let mut device = SelectedDevice {
            id: "d1".to_string(),
            name: Some("ap-lobby".to_string()),
            nickname: Some("Lobby".to_string()),
        };
        assert_eq!(device.label(), "Lobby (ID: d1)");

        device.nickname = None;
        assert_eq!(device.label(), "ap-lobby (ID: d1)");

        device.name = None;
        assert_eq!(device.label(), "N/A (ID: d1)");
    }
}

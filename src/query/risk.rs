//! At-risk evaluation over the latest-status projection.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::StatusReport;

/// Thresholds for the at-risk predicate.
#[derive(Debug, Clone, Copy)]
pub struct RiskThresholds {
    /// Latest reports older than this are stale.
    pub stale_after: Duration,
    /// Battery levels strictly below this are at risk.
    pub low_battery: i64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            stale_after: Duration::minutes(30),
            low_battery: 20,
        }
    }
}

/// One at-risk device.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub device_id: String,
    pub battery_level: i64,
    pub last_update: DateTime<Utc>,
}

/// Apply the at-risk predicate to the latest-status projection.
///
/// A device is at risk iff its latest report has `battery_level <
/// low_battery` or a timestamp strictly older than `now - stale_after`.
/// Only the single latest report per device is consulted; a device with a
/// fresh healthy reading is never flagged for an older one. Output order
/// follows the input projection (sorted by device id) so results are
/// reproducible, but callers must not depend on it.
pub fn evaluate(
    latest: &[StatusReport],
    now: DateTime<Utc>,
    thresholds: RiskThresholds,
) -> Vec<RiskAssessment> {
    let stale_cutoff = now - thresholds.stale_after;

    latest
        .iter()
        .filter(|r| r.battery_level < thresholds.low_battery || r.timestamp < stale_cutoff)
        .map(|r| RiskAssessment {
            device_id: r.device_id.clone(),
            battery_level: r.battery_level,
            last_update: r.timestamp,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(device_id: &str, timestamp: DateTime<Utc>, battery_level: i64) -> StatusReport {
        StatusReport {
            id: 1,
            device_id: device_id.to_string(),
            timestamp,
            battery_level,
            rssi: -60,
            online: true,
            created_at: timestamp,
        }
    }

    #[test]
    fn test_low_battery_boundary() {
        let now = Utc::now();
        let latest = vec![
            report("sensor-19", now, 19),
            report("sensor-20", now, 20),
        ];

        let risks = evaluate(&latest, now, RiskThresholds::default());
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].device_id, "sensor-19");
    }

    #[test]
    fn test_staleness_boundary_is_strict() {
        let now = Utc::now();
        let latest = vec![
            report("exactly-30m", now - Duration::minutes(30), 80),
            report("just-over", now - Duration::minutes(30) - Duration::seconds(1), 80),
        ];

        let risks = evaluate(&latest, now, RiskThresholds::default());
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].device_id, "just-over");
    }

    #[test]
    fn test_healthy_fleet_yields_empty_list() {
        let now = Utc::now();
        let latest = vec![report("sensor-1", now, 90)];

        assert!(evaluate(&latest, now, RiskThresholds::default()).is_empty());
    }

    #[test]
    fn test_empty_projection_yields_empty_list() {
        assert!(evaluate(&[], Utc::now(), RiskThresholds::default()).is_empty());
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let now = Utc::now();
        let latest = vec![
            report("sensor-a", now - Duration::hours(2), 90),
            report("sensor-b", now, 10),
        ];

        let first = evaluate(&latest, now, RiskThresholds::default());
        let second = evaluate(&latest, now, RiskThresholds::default());
        assert_eq!(first.len(), 2);
        let ids: Vec<_> = first.iter().map(|r| r.device_id.clone()).collect();
        let ids2: Vec<_> = second.iter().map(|r| r.device_id.clone()).collect();
        assert_eq!(ids, ids2);
    }

    #[test]
    fn test_custom_thresholds() {
        let now = Utc::now();
        let latest = vec![report("sensor-1", now, 45)];
        let thresholds = RiskThresholds {
            stale_after: Duration::minutes(5),
            low_battery: 50,
        };

        let risks = evaluate(&latest, now, thresholds);
        assert_eq!(risks.len(), 1);
    }
}

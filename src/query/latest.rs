//! Latest-status projection and fleet summary.
//!
//! The projection itself is maintained by the write path (the
//! `device_latest` table updated transactionally on every insert), so
//! reads here cost one indexed join per request regardless of how much
//! history has accumulated.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{StatusReport, Store};
use crate::error::Result;

/// One device's entry in the fleet summary.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device_id: String,
    pub battery_level: i64,
    pub online: bool,
    pub last_update: DateTime<Utc>,
}

/// Fleet-wide summary built from the latest-status projection.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub devices: Vec<DeviceSummary>,
    pub total_devices: usize,
    pub online_devices: usize,
    pub offline_devices: usize,
}

/// Latest report per device, ordered by device id. One entry per distinct
/// device that has ever reported.
pub fn latest_statuses(store: &Store) -> Result<Vec<StatusReport>> {
    Ok(store.latest_statuses()?)
}

/// Latest report for one device, if any.
pub fn latest_for_device(store: &Store, device_id: &str) -> Result<Option<StatusReport>> {
    Ok(store.latest_for_device(device_id)?)
}

/// Shape the projection into the summary response. An empty projection
/// yields an empty-but-valid summary, not an error.
pub fn fleet_summary(latest: &[StatusReport]) -> FleetSummary {
    let devices: Vec<DeviceSummary> = latest
        .iter()
        .map(|r| DeviceSummary {
            device_id: r.device_id.clone(),
            battery_level: r.battery_level,
            online: r.online,
            last_update: r.timestamp,
        })
        .collect();

    let online_devices = devices.iter().filter(|d| d.online).count();
    let offline_devices = devices.len() - online_devices;

    FleetSummary {
        total_devices: devices.len(),
        online_devices,
        offline_devices,
        devices,
    }
}

//! Database model types and input validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BATTERY_MIN: i64 = 0;
const BATTERY_MAX: i64 = 100;

/// A single device status report, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub id: i64,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub battery_level: i64,
    pub rssi: i64,
    pub online: bool,
    /// Server-assigned write time. Audit only, never used for ordering.
    pub created_at: DateTime<Utc>,
}

/// Client-supplied payload for recording a status report.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReportInput {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub battery_level: i64,
    pub rssi: i64,
    pub online: bool,
}

/// Validates a status report payload before anything touches the store.
pub fn validate(input: &StatusReportInput) -> Result<()> {
    if input.device_id.is_empty() {
        return Err(Error::Validation(
            "device_id must not be empty".to_string(),
        ));
    }

    if input.battery_level < BATTERY_MIN || input.battery_level > BATTERY_MAX {
        return Err(Error::Validation(format!(
            "battery_level {} out of range [{}, {}]",
            input.battery_level, BATTERY_MIN, BATTERY_MAX
        )));
    }

    Ok(())
}

//! Configuration module for FleetPulse.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "fleetpulse.db")
    pub db_path: String,
    /// Shared secret expected in the X-API-Key header
    pub api_key: String,
    /// Minutes after which a device's latest report counts as stale (default: 30)
    pub stale_after_minutes: i64,
    /// Battery percentage below which a device is at risk (default: 20)
    pub low_battery: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "fleetpulse.db".to_string(),
            api_key: "supersecretkey123".to_string(),
            stale_after_minutes: 30,
            low_battery: 20,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLEETPULSE_HTTP_PORT`: HTTP port (default: 8080)
    /// - `FLEETPULSE_DB_PATH`: Database file path (default: "fleetpulse.db")
    /// - `FLEETPULSE_API_KEY`: shared secret for all /status endpoints
    /// - `FLEETPULSE_STALE_AFTER_MINUTES`: staleness window (default: 30)
    /// - `FLEETPULSE_LOW_BATTERY`: low-battery threshold (default: 20)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("FLEETPULSE_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(db_path) = env::var("FLEETPULSE_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Ok(api_key) = env::var("FLEETPULSE_API_KEY") {
            cfg.api_key = api_key;
        }

        if let Ok(minutes_str) = env::var("FLEETPULSE_STALE_AFTER_MINUTES") {
            if let Ok(minutes) = minutes_str.parse() {
                cfg.stale_after_minutes = minutes;
            }
        }

        if let Ok(battery_str) = env::var("FLEETPULSE_LOW_BATTERY") {
            if let Ok(battery) = battery_str.parse() {
                cfg.low_battery = battery;
            }
        }

        cfg
    }
}

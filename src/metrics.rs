//! Prometheus metrics for the status service.

use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref HEARTBEAT_COUNT: Counter = Counter::with_opts(Opts::new(
        "heartbeat_count",
        "Number of status reports received"
    ))
    .unwrap();
    pub static ref ONLINE_DEVICES: Gauge = Gauge::with_opts(Opts::new(
        "online_devices",
        "Number of devices whose latest report is online"
    ))
    .unwrap();
    pub static ref AT_RISK_DEVICES: Gauge = Gauge::with_opts(Opts::new(
        "at_risk_devices",
        "Number of at-risk devices at last evaluation"
    ))
    .unwrap();
    pub static ref AVERAGE_BATTERY: Gauge = Gauge::with_opts(Opts::new(
        "average_battery",
        "Average battery level across latest device reports"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(HEARTBEAT_COUNT.clone())).unwrap();
    REGISTRY.register(Box::new(ONLINE_DEVICES.clone())).unwrap();
    REGISTRY.register(Box::new(AT_RISK_DEVICES.clone())).unwrap();
    REGISTRY.register(Box::new(AVERAGE_BATTERY.clone())).unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

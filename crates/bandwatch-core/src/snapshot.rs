//! Presentation snapshot consumed by the panel layer.
//!
//! The poller assembles one [`PanelSnapshot`] per tick; the panel renders it
//! and nothing else. Sections are independent — a sub-resource fetch failing
//! leaves its section at the previous value while the rest update.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::window::ChartPoint;

/// Antenna feed for one port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AntennaMode {
    External,
    Internal,
}

impl AntennaMode {
    /// The device reports `"1"` for an externally supplied antenna.
    pub fn from_flag(flag: &str) -> Self {
        if flag.trim() == "1" {
            AntennaMode::External
        } else {
            AntennaMode::Internal
        }
    }
}

impl std::fmt::Display for AntennaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AntennaMode::External => write!(f, "EXT"),
            AntennaMode::Internal => write!(f, "INT"),
        }
    }
}

/// Normalized chart window for one metric, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct MetricChart {
    pub metric: String,
    pub points: Vec<Option<ChartPoint>>,
}

/// Live-signal section of the snapshot: raw display strings plus the
/// decoded identifiers derived from them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalSection {
    pub rsrp: Option<String>,
    pub rsrq: Option<String>,
    pub sinr: Option<String>,
    pub rssi: Option<String>,
    /// Whether the device reported an NR (5G) carrier this tick.
    pub nr_present: bool,
    pub nrrsrp: Option<String>,
    pub nrrsrq: Option<String>,
    pub nrsinr: Option<String>,
    pub band: Option<String>,
    pub dl_bandwidth: Option<String>,
    pub ul_bandwidth: Option<String>,
    pub cell_id: Option<String>,
    pub enb_id: Option<String>,
    pub plmn: Option<String>,
    pub bts_map_url: Option<String>,
    pub charts: Vec<MetricChart>,
}

/// Everything the panel shows, one struct per poll tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PanelSnapshot {
    pub signal: Option<SignalSection>,
    pub antenna1: Option<AntennaMode>,
    pub antenna2: Option<AntennaMode>,
    /// Decoded `B{n}` list the device currently permits.
    pub allowed_bands: Option<String>,
    /// Carrier aggregation active (network type code 1011).
    pub carrier_aggregation: Option<bool>,
    /// A band-lock sequence is in flight; telemetry is suspended.
    pub lock_in_flight: bool,
    /// Transient user-visible message; self-clears after a few seconds.
    pub notice: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

//! Rolling telemetry windows feeding the signal charts.
//!
//! Each metric owns a fixed-capacity, newest-first window of clamped float
//! samples. The capacity comes from the chart geometry: one bar slot every
//! `SEGMENT_GAP + 1` pixels across a `CHART_WIDTH`-pixel strip.
//!
//! Readings arrive as raw device strings with a fixed-width units suffix
//! (`"-97dBm"`, `"13dB"`). A reading that does not parse still advances its
//! window slot — the device convention for "no reading" — but is hidden from
//! the visible view.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

/// Chart strip width in pixels.
pub const CHART_WIDTH: u32 = 500;

/// Gap between bar slots in pixels.
pub const SEGMENT_GAP: u32 = 11;

/// Samples a window retains: one per bar slot.
pub const fn window_capacity() -> usize {
    (CHART_WIDTH / (SEGMENT_GAP + 1)) as usize
}

/// Errors from sample ingestion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// The reading did not parse once its units suffix was stripped. The
    /// window slot has still been advanced.
    #[error("unparsable {metric} sample {raw:?}")]
    UnparsableSample { metric: String, raw: String },
}

/// Device encoding for one metric: units-suffix width and display range.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub suffix_len: usize,
    pub min: f64,
    pub max: f64,
}

// ─── Quantization ───────────────────────────────────────────────────────────

/// Quality bucket the chart colors by. The boundaries (25/50/75% of range)
/// are a contract with the chart renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalTier {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SignalTier {
    /// Bucket for a normalized position in `[0, 1]`.
    pub fn for_ratio(ratio: f64) -> Self {
        if ratio < 0.25 {
            SignalTier::Poor
        } else if ratio < 0.5 {
            SignalTier::Fair
        } else if ratio < 0.75 {
            SignalTier::Good
        } else {
            SignalTier::Excellent
        }
    }
}

/// One charted sample: position within the metric's range plus its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub ratio: f64,
    pub tier: SignalTier,
}

// ─── Aggregator ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MetricWindow {
    /// Newest first. NaN marks an advanced slot with no reading.
    samples: VecDeque<f64>,
}

impl MetricWindow {
    fn insert(&mut self, capacity: usize, value: f64) {
        self.samples.push_front(value);
        self.samples.truncate(capacity);
    }
}

/// One named window per telemetry metric.
#[derive(Debug)]
pub struct WindowAggregator {
    capacity: usize,
    windows: HashMap<String, MetricWindow>,
}

impl WindowAggregator {
    pub fn new() -> Self {
        Self::with_capacity(window_capacity())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WindowAggregator {
            capacity,
            windows: HashMap::new(),
        }
    }

    /// Ingest one raw reading and return the updated normalized view.
    ///
    /// The trailing `spec.suffix_len` characters are stripped before parsing;
    /// the parsed value is clamped to `[spec.min, spec.max]`. An unparsable
    /// reading advances the slot and returns [`SampleError::UnparsableSample`].
    pub fn push(
        &mut self,
        metric: &str,
        raw: &str,
        spec: MetricSpec,
    ) -> Result<Vec<Option<ChartPoint>>, SampleError> {
        let window = self.windows.entry(metric.to_string()).or_default();

        match strip_suffix_and_parse(raw, spec.suffix_len) {
            Some(value) => {
                window.insert(self.capacity, value.clamp(spec.min, spec.max));
                Ok(self.view(metric, spec))
            }
            None => {
                window.insert(self.capacity, f64::NAN);
                Err(SampleError::UnparsableSample {
                    metric: metric.to_string(),
                    raw: raw.to_string(),
                })
            }
        }
    }

    /// Newest-first normalized view of a metric's window. Slots with no
    /// reading surface as `None`.
    pub fn view(&self, metric: &str, spec: MetricSpec) -> Vec<Option<ChartPoint>> {
        let Some(window) = self.windows.get(metric) else {
            return Vec::new();
        };
        window
            .samples
            .iter()
            .map(|&value| {
                if value.is_nan() {
                    return None;
                }
                let ratio = (value - spec.min) / (spec.max - spec.min);
                Some(ChartPoint {
                    ratio,
                    tier: SignalTier::for_ratio(ratio),
                })
            })
            .collect()
    }

    /// Retained slot count for a metric, NaN slots included.
    pub fn len(&self, metric: &str) -> usize {
        self.windows.get(metric).map_or(0, |w| w.samples.len())
    }

    pub fn is_empty(&self, metric: &str) -> bool {
        self.len(metric) == 0
    }
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the fixed-width units suffix and parse what remains.
fn strip_suffix_and_parse(raw: &str, suffix_len: usize) -> Option<f64> {
    let raw = raw.trim();
    let chars = raw.chars().count();
    if chars <= suffix_len {
        return None;
    }
    let value: String = raw.chars().take(chars - suffix_len).collect();
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSRP: MetricSpec = MetricSpec {
        suffix_len: 3,
        min: -130.0,
        max: -60.0,
    };
    const SINR: MetricSpec = MetricSpec {
        suffix_len: 2,
        min: 0.0,
        max: 24.0,
    };

    // ─── Parsing & Clamping ─────────────────────────────────────────────

    #[test]
    fn strips_units_suffix() {
        let mut agg = WindowAggregator::new();
        let view = agg.push("rsrp", "-97dBm", RSRP).unwrap();
        let point = view[0].unwrap();
        let expected = (-97.0 - RSRP.min) / (RSRP.max - RSRP.min);
        assert!((point.ratio - expected).abs() < 1e-9);
    }

    #[test]
    fn clamps_to_range() {
        let mut agg = WindowAggregator::new();
        agg.push("rsrp", "-150dBm", RSRP).unwrap();
        agg.push("rsrp", "-10dBm", RSRP).unwrap();
        let view = agg.view("rsrp", RSRP);
        assert!((view[0].unwrap().ratio - 1.0).abs() < 1e-9);
        assert!(view[1].unwrap().ratio.abs() < 1e-9);
    }

    #[test]
    fn unparsable_reading_advances_slot() {
        let mut agg = WindowAggregator::new();
        agg.push("sinr", "13dB", SINR).unwrap();
        let err = agg.push("sinr", "dB", SINR).unwrap_err();
        assert!(matches!(err, SampleError::UnparsableSample { .. }));

        assert_eq!(agg.len("sinr"), 2);
        let view = agg.view("sinr", SINR);
        assert!(view[0].is_none(), "no-reading slot must be hidden");
        assert!(view[1].is_some());
    }

    #[test]
    fn reading_shorter_than_suffix_is_unparsable() {
        let mut agg = WindowAggregator::new();
        assert!(agg.push("rsrp", "dB", RSRP).is_err());
        assert_eq!(agg.len("rsrp"), 1);
    }

    // ─── Capacity ───────────────────────────────────────────────────────

    #[test]
    fn derived_capacity_matches_chart_geometry() {
        assert_eq!(window_capacity(), 41);
    }

    #[test]
    fn capacity_never_exceeded() {
        let mut agg = WindowAggregator::with_capacity(5);
        for i in 0..20 {
            agg.push("sinr", &format!("{i}dB"), SINR).unwrap();
            assert!(agg.len("sinr") <= 5);
        }
        assert_eq!(agg.len("sinr"), 5);
    }

    #[test]
    fn newest_first_and_oldest_dropped() {
        let mut agg = WindowAggregator::with_capacity(3);
        for i in [1, 2, 3, 4] {
            agg.push("sinr", &format!("{i}dB"), SINR).unwrap();
        }
        let view = agg.view("sinr", SINR);
        let ratios: Vec<f64> = view.iter().map(|p| p.unwrap().ratio).collect();
        // 4 is newest; 1 fell off the tail.
        assert!((ratios[0] - 4.0 / 24.0).abs() < 1e-9);
        assert!((ratios[2] - 2.0 / 24.0).abs() < 1e-9);
    }

    #[test]
    fn retained_values_stay_in_range() {
        let mut agg = WindowAggregator::with_capacity(8);
        for raw in ["-200dBm", "-97dBm", "0dBm", "-130dBm", "-59dBm"] {
            agg.push("rsrp", raw, RSRP).unwrap();
        }
        for point in agg.view("rsrp", RSRP).into_iter().flatten() {
            assert!((0.0..=1.0).contains(&point.ratio));
        }
    }

    #[test]
    fn unknown_metric_views_empty() {
        let agg = WindowAggregator::new();
        assert!(agg.view("rsrq", RSRP).is_empty());
        assert!(agg.is_empty("rsrq"));
    }

    // ─── Quantization ───────────────────────────────────────────────────

    #[test]
    fn tier_boundaries() {
        assert_eq!(SignalTier::for_ratio(0.0), SignalTier::Poor);
        assert_eq!(SignalTier::for_ratio(0.249), SignalTier::Poor);
        assert_eq!(SignalTier::for_ratio(0.25), SignalTier::Fair);
        assert_eq!(SignalTier::for_ratio(0.5), SignalTier::Good);
        assert_eq!(SignalTier::for_ratio(0.75), SignalTier::Excellent);
        assert_eq!(SignalTier::for_ratio(1.0), SignalTier::Excellent);
    }
}

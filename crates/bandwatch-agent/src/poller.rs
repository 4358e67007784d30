//! Telemetry polling loop.
//!
//! Every tick fetches the four device sub-resources (signal, net-mode,
//! status, antenna) concurrently and folds the results into the shared
//! [`PanelSnapshot`]. One sub-resource failing never blocks the others;
//! its snapshot section just keeps the previous value.
//!
//! While a band-lock sequence is in flight the whole tick is skipped — all
//! four fetches together, not just the signal read. Ticks never overlap:
//! the loop awaits every fetch of a tick before sleeping again, so samples
//! cannot be applied out of order.

use std::sync::Arc;

use chrono::Utc;

use bandwatch_core::band::{decode_mask, mask_from_hex};
use bandwatch_core::cell;
use bandwatch_core::snapshot::{AntennaMode, MetricChart, SignalSection};
use bandwatch_core::window::{MetricSpec, WindowAggregator};

use crate::xml::extract_tag;
use crate::AgentState;

/// Device encodings for the charted metrics: units-suffix width and range.
const RSRP_SPEC: MetricSpec = MetricSpec {
    suffix_len: 3,
    min: -130.0,
    max: -60.0,
};
const RSRQ_SPEC: MetricSpec = MetricSpec {
    suffix_len: 2,
    min: -16.0,
    max: -3.0,
};
const SINR_SPEC: MetricSpec = MetricSpec {
    suffix_len: 2,
    min: 0.0,
    max: 24.0,
};

/// Network type code reported while carrier aggregation is active.
const NETWORK_TYPE_CA: &str = "1011";

/// Run the telemetry loop until shutdown.
pub async fn run(state: Arc<AgentState>) {
    let mut interval = tokio::time::interval(state.config.poll_interval);

    loop {
        interval.tick().await;

        if *state.shutdown.borrow() {
            return;
        }

        if state.orchestrator.suspended() {
            tracing::debug!("lock sequence in flight; skipping poll tick");
            let mut snapshot = state.snapshot.lock().await;
            snapshot.lock_in_flight = true;
            snapshot.notice = state.orchestrator.notice();
            continue;
        }

        poll_once(&state).await;
    }
}

/// One poll tick: fetch, parse what parses, publish the snapshot.
pub async fn poll_once(state: &AgentState) {
    let (signal, net_mode, status, antenna) = tokio::join!(
        state.client.fetch_signal(),
        state.client.fetch_net_mode(),
        state.client.fetch_status(),
        state.client.fetch_antenna(),
    );

    let mut snapshot = state.snapshot.lock().await.clone();

    match signal {
        Ok(body) => {
            let mut aggregator = state.aggregator.lock().await;
            snapshot.signal = Some(build_signal_section(&mut aggregator, &body));
        }
        Err(error) => tracing::warn!(%error, "signal fetch failed"),
    }

    match net_mode {
        Ok(body) => match extract_tag("LTEBand", &body).and_then(mask_from_hex) {
            Some(mask) => snapshot.allowed_bands = Some(decode_mask(mask)),
            None => tracing::warn!("net-mode response carried no parsable LTEBand"),
        },
        Err(error) => tracing::warn!(%error, "net-mode fetch failed"),
    }

    match status {
        Ok(body) => {
            if let Some(code) = extract_tag("CurrentNetworkTypeEx", &body) {
                snapshot.carrier_aggregation = Some(code.trim() == NETWORK_TYPE_CA);
            }
        }
        Err(error) => tracing::warn!(%error, "status fetch failed"),
    }

    match antenna {
        Ok(body) => {
            snapshot.antenna1 = extract_tag("antenna1type", &body).map(AntennaMode::from_flag);
            snapshot.antenna2 = extract_tag("antenna2type", &body).map(AntennaMode::from_flag);
        }
        Err(error) => tracing::warn!(%error, "antenna fetch failed"),
    }

    snapshot.lock_in_flight = state.orchestrator.suspended();
    snapshot.notice = state.orchestrator.notice();
    snapshot.updated_at = Some(Utc::now());

    tracing::trace!(
        signal = snapshot.signal.is_some(),
        allowed = snapshot.allowed_bands.as_deref().unwrap_or("-"),
        "poll tick"
    );

    *state.snapshot.lock().await = snapshot;
}

/// Parse the live-signal body into a snapshot section, feeding the chart
/// windows along the way.
fn build_signal_section(aggregator: &mut WindowAggregator, body: &str) -> SignalSection {
    let field = |tag: &str| extract_tag(tag, body).map(str::to_string);

    let mut section = SignalSection {
        rsrp: field("rsrp"),
        rsrq: field("rsrq"),
        sinr: field("sinr"),
        rssi: field("rssi"),
        nrrsrp: field("nrrsrp"),
        nrrsrq: field("nrrsrq"),
        nrsinr: field("nrsinr"),
        band: field("band"),
        dl_bandwidth: field("dlbandwidth"),
        ul_bandwidth: field("ulbandwidth"),
        cell_id: field("cell_id"),
        plmn: field("plmn"),
        ..Default::default()
    };

    // The device reports the literal string "undefined" on non-NR firmware.
    section.nr_present = matches!(section.nrrsrp.as_deref(), Some(v) if v != "undefined");

    let mut charts = Vec::new();
    push_chart(aggregator, &mut charts, "rsrp", section.rsrp.as_deref(), RSRP_SPEC);
    push_chart(aggregator, &mut charts, "rsrq", section.rsrq.as_deref(), RSRQ_SPEC);
    push_chart(aggregator, &mut charts, "sinr", section.sinr.as_deref(), SINR_SPEC);
    if section.nr_present {
        push_chart(aggregator, &mut charts, "nrrsrp", section.nrrsrp.as_deref(), RSRP_SPEC);
        push_chart(aggregator, &mut charts, "nrrsrq", section.nrrsrq.as_deref(), RSRQ_SPEC);
        push_chart(aggregator, &mut charts, "nrsinr", section.nrsinr.as_deref(), SINR_SPEC);
    }
    section.charts = charts;

    if let Some(cell_id) = section.cell_id.clone() {
        match cell::decode_enb_id(&cell_id) {
            Ok(enb_id) => {
                if let Some(plmn) = section.plmn.as_deref() {
                    let normalized = cell::normalize_plmn(plmn, enb_id.len());
                    section.bts_map_url = Some(cell::bts_map_url(&normalized, &enb_id));
                }
                section.enb_id = Some(enb_id);
            }
            Err(error) => tracing::warn!(%error, cell_id, "cell id did not decode"),
        }
    }

    section
}

/// Push one reading and record the resulting chart view. An unparsable
/// reading (or a missing tag) still advances the window slot.
fn push_chart(
    aggregator: &mut WindowAggregator,
    charts: &mut Vec<MetricChart>,
    metric: &str,
    raw: Option<&str>,
    spec: MetricSpec,
) {
    let raw = raw.unwrap_or("");
    let points = match aggregator.push(metric, raw, spec) {
        Ok(points) => points,
        Err(error) => {
            tracing::warn!(%error, "no reading for metric this tick");
            aggregator.view(metric, spec)
        }
    };
    charts.push(MetricChart {
        metric: metric.to_string(),
        points,
    });
}

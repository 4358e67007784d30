//! Bandwatch agent library.
//!
//! Wires the core logic to one modem:
//! - [`client`] — reqwest client for the XML-over-HTTP management API
//! - [`orchestrator`] — the band-lock state machine
//! - [`poller`] — the periodic telemetry loop
//! - [`panel`] — the HTTP surface the presentation layer consumes
//! - [`config`] / [`xml`] — configuration and tag extraction helpers

pub mod client;
pub mod config;
pub mod orchestrator;
pub mod panel;
pub mod poller;
pub mod xml;

use bandwatch_core::snapshot::PanelSnapshot;
use bandwatch_core::window::WindowAggregator;
use tokio::sync::watch;

use crate::client::ModemClient;
use crate::config::AgentConfig;
use crate::orchestrator::BandLockOrchestrator;

/// Shared agent state accessible from all tasks.
///
/// The aggregator is mutated only by the poller; the orchestrator mutates
/// only its own state. Everything else is read-only after construction.
pub struct AgentState {
    pub config: AgentConfig,
    pub client: ModemClient,
    pub orchestrator: BandLockOrchestrator,
    pub aggregator: tokio::sync::Mutex<WindowAggregator>,
    pub snapshot: tokio::sync::Mutex<PanelSnapshot>,
    pub shutdown: watch::Receiver<bool>,
}

impl AgentState {
    pub fn new(config: AgentConfig, shutdown: watch::Receiver<bool>) -> Self {
        let client = ModemClient::new(&config.modem_url, config.request_timeout);
        let orchestrator = BandLockOrchestrator::new(
            client.clone(),
            config.settle_delay,
            config.phase_delay,
            config.notice_clear,
        );
        AgentState {
            client,
            orchestrator,
            aggregator: tokio::sync::Mutex::new(WindowAggregator::new()),
            snapshot: tokio::sync::Mutex::new(PanelSnapshot::default()),
            config,
            shutdown,
        }
    }
}

//! Agent configuration.
//!
//! A TOML file provides the base values (every field optional); CLI flags
//! override individual fields in `main`. The raw [`AgentConfigInput`] is
//! resolved into a validated [`AgentConfig`] with `Duration` fields and
//! floor clamps applied.

use std::time::Duration;

use serde::Deserialize;

/// Raw TOML shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentConfigInput {
    pub modem_url: Option<String>,
    pub listen_addr: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub phase_delay_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub notice_clear_ms: Option<u64>,
    pub force_lte_only: Option<bool>,
}

/// Resolved agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Modem management base URL, no trailing slash.
    pub modem_url: String,
    /// Panel API listen address.
    pub listen_addr: String,
    /// Telemetry poll period.
    pub poll_interval: Duration,
    /// Settling delay before every configuration submission.
    pub settle_delay: Duration,
    /// Delay between the main-band phase and the full-combination phase.
    pub phase_delay: Duration,
    /// Bound on every outbound request.
    pub request_timeout: Duration,
    /// How long a transient notice stays visible.
    pub notice_clear: Duration,
    /// Submit network mode 03 (LTE only) instead of 00 (auto).
    pub force_lte_only: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            modem_url: "http://192.168.8.1".to_string(),
            listen_addr: "127.0.0.1:8280".to_string(),
            poll_interval: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
            phase_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            notice_clear: Duration::from_secs(5),
            force_lte_only: false,
        }
    }
}

impl AgentConfigInput {
    /// Fill gaps with defaults and apply floor clamps.
    pub fn resolve(self) -> AgentConfig {
        let defaults = AgentConfig::default();
        AgentConfig {
            modem_url: self
                .modem_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.modem_url),
            listen_addr: self.listen_addr.unwrap_or(defaults.listen_addr),
            poll_interval: self
                .poll_interval_ms
                .map(|ms| Duration::from_millis(ms.max(100)))
                .unwrap_or(defaults.poll_interval),
            settle_delay: self
                .settle_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            phase_delay: self
                .phase_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.phase_delay),
            request_timeout: self
                .request_timeout_ms
                .map(|ms| Duration::from_millis(ms.max(500)))
                .unwrap_or(defaults.request_timeout),
            notice_clear: self
                .notice_clear_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.notice_clear),
            force_lte_only: self.force_lte_only.unwrap_or(defaults.force_lte_only),
        }
    }
}

impl AgentConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, String> {
        if input.trim().is_empty() {
            return Ok(AgentConfig::default());
        }
        let parsed: AgentConfigInput =
            toml::from_str(input).map_err(|e| format!("invalid config TOML: {e}"))?;
        Ok(parsed.resolve())
    }
}

//! Band-lock orchestration.
//!
//! Applying a selection with a main-marked band (`"3m+1+20"`) takes two
//! sequential device submissions: the main band alone, then the full
//! combination. Each submission fetches a fresh session token, waits a
//! settling delay, and POSTs the configuration payload. The whole sequence
//! is one state machine:
//!
//! ```text
//! Idle → FetchingToken → Submitting ─┬→ Idle
//!                                    └→ AwaitingSecondaryPhase
//!                                         → FetchingToken → Submitting → Idle
//! ```
//!
//! The orchestrator owns its state exclusively; the telemetry poller only
//! reads the derived `suspended()` flag and stays quiet while a sequence is
//! in flight. A failed submission drops any pending second phase — there
//! are no automatic retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bandwatch_core::band::{mask_to_hex, BandError, BandSelection};

use crate::client::{ClientError, ModemClient};

/// Network mode codes for the configuration payload.
const MODE_AUTO: &str = "00";
const MODE_LTE_ONLY: &str = "03";

/// Where a lock sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Idle,
    FetchingToken,
    Submitting,
    AwaitingSecondaryPhase,
}

/// Errors from a lock sequence.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another sequence is in flight; this call was rejected, not queued.
    #[error("a band-lock sequence is already in flight")]
    Busy,
    #[error(transparent)]
    Band(#[from] BandError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Drives band-lock sequences against one modem.
pub struct BandLockOrchestrator {
    client: ModemClient,
    state: Mutex<LockState>,
    /// Monotonic sequence counter, for log correlation.
    seq: AtomicU64,
    /// Transient user-visible message; expires `notice_clear` after posting.
    notice: Mutex<Option<(Instant, String)>>,
    settle_delay: Duration,
    phase_delay: Duration,
    notice_clear: Duration,
}

impl BandLockOrchestrator {
    pub fn new(
        client: ModemClient,
        settle_delay: Duration,
        phase_delay: Duration,
        notice_clear: Duration,
    ) -> Self {
        BandLockOrchestrator {
            client,
            state: Mutex::new(LockState::Idle),
            seq: AtomicU64::new(0),
            notice: Mutex::new(None),
            settle_delay,
            phase_delay,
            notice_clear,
        }
    }

    pub fn state(&self) -> LockState {
        *self.state.lock().unwrap()
    }

    /// Telemetry fetches must be suppressed while this is true.
    pub fn suspended(&self) -> bool {
        self.state() != LockState::Idle
    }

    /// Current transient notice, `None` once it has expired.
    pub fn notice(&self) -> Option<String> {
        let notice = self.notice.lock().unwrap();
        notice.as_ref().and_then(|(posted_at, message)| {
            (posted_at.elapsed() < self.notice_clear).then(|| message.clone())
        })
    }

    /// Apply a band selection expression against the modem.
    ///
    /// With a main-marked band the sequence submits twice; a failure in the
    /// first phase means the second never runs. Only one sequence may be in
    /// flight — concurrent calls get [`LockError::Busy`]. If this future is
    /// dropped mid-sequence the state returns to `Idle`.
    pub async fn apply(&self, expression: &str, force_lte_only: bool) -> Result<(), LockError> {
        let selection = BandSelection::parse(expression)?;
        self.claim()?;
        let _reset = StateGuard { orchestrator: self };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;

        tracing::info!(seq, expression, force_lte_only, "band lock requested");
        let result = self.run_sequence(seq, &selection, force_lte_only).await;
        match &result {
            Ok(()) => tracing::info!(seq, "band lock applied"),
            Err(error) => {
                tracing::warn!(seq, %error, "band lock failed");
                self.post_notice(format!("Band selection failed: {error}"));
            }
        }
        result
    }

    async fn run_sequence(
        &self,
        seq: u64,
        selection: &BandSelection,
        force_lte_only: bool,
    ) -> Result<(), LockError> {
        let mode = if force_lte_only { MODE_LTE_ONLY } else { MODE_AUTO };

        match selection.main_band() {
            Some(main) => {
                let first = BandSelection::Bands {
                    bands: vec![main],
                    main: None,
                };
                tracing::info!(seq, main, "applying main band before full combination");
                self.submit_once(seq, &first, mode).await?;

                self.set_state(LockState::AwaitingSecondaryPhase);
                tokio::time::sleep(self.phase_delay).await;

                self.submit_once(seq, &selection.without_main(), mode).await?;
            }
            None => {
                self.submit_once(seq, selection, mode).await?;
            }
        }
        Ok(())
    }

    async fn submit_once(
        &self,
        seq: u64,
        selection: &BandSelection,
        mode: &str,
    ) -> Result<(), ClientError> {
        self.set_state(LockState::FetchingToken);
        let token = self.client.fetch_session_token().await?;

        self.set_state(LockState::Submitting);
        // Let the device finish whatever the previous write set in motion.
        tokio::time::sleep(self.settle_delay).await;

        let mask_hex = mask_to_hex(selection.mask());
        tracing::debug!(seq, mode, mask = %mask_hex, "submitting band lock");
        self.client.submit_band_lock(mode, &mask_hex, &token).await
    }

    fn claim(&self) -> Result<(), LockError> {
        let mut state = self.state.lock().unwrap();
        if *state != LockState::Idle {
            return Err(LockError::Busy);
        }
        *state = LockState::FetchingToken;
        Ok(())
    }

    fn set_state(&self, next: LockState) {
        *self.state.lock().unwrap() = next;
    }

    fn post_notice(&self, message: String) {
        *self.notice.lock().unwrap() = Some((Instant::now(), message));
    }
}

/// Restores `Idle` when a sequence ends — including when its future is
/// dropped mid-sleep.
struct StateGuard<'a> {
    orchestrator: &'a BandLockOrchestrator,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.set_state(LockState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> BandLockOrchestrator {
        let client = ModemClient::new("http://127.0.0.1:1", Duration::from_millis(50));
        BandLockOrchestrator::new(
            client,
            Duration::ZERO,
            Duration::ZERO,
            Duration::from_millis(40),
        )
    }

    #[test]
    fn starts_idle_and_not_suspended() {
        let orch = orchestrator();
        assert_eq!(orch.state(), LockState::Idle);
        assert!(!orch.suspended());
    }

    #[test]
    fn claim_rejects_second_sequence() {
        let orch = orchestrator();
        orch.claim().unwrap();
        assert!(orch.suspended());
        assert!(matches!(orch.claim(), Err(LockError::Busy)));
    }

    #[test]
    fn state_guard_restores_idle() {
        let orch = orchestrator();
        orch.claim().unwrap();
        {
            let _guard = StateGuard {
                orchestrator: &orch,
            };
            orch.set_state(LockState::Submitting);
        }
        assert_eq!(orch.state(), LockState::Idle);
    }

    #[test]
    fn notice_expires_after_clear_interval() {
        let orch = orchestrator();
        orch.post_notice("Band selection failed".to_string());
        assert!(orch.notice().is_some());
        std::thread::sleep(Duration::from_millis(60));
        assert!(orch.notice().is_none());
    }

    #[test]
    fn newer_notice_outlives_a_stale_clear() {
        let orch = orchestrator();
        orch.post_notice("first".to_string());
        std::thread::sleep(Duration::from_millis(25));
        orch.post_notice("second".to_string());
        std::thread::sleep(Duration::from_millis(25));
        // 50ms after the first post, but the second is still fresh.
        assert_eq!(orch.notice().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn invalid_expression_never_claims_state() {
        let orch = orchestrator();
        let result = orch.apply("banana", false).await;
        assert!(matches!(result, Err(LockError::Band(_))));
        assert_eq!(orch.state(), LockState::Idle);
    }
}

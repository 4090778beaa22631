// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sweeper (spec §4.F): a periodic janitor running alongside the
//! orchestrator. It recovers sessions stranded mid-transition by a crash,
//! reaps sessions that have overstayed their welcome, and reclaims
//! resources (leases, on-disk artifacts) that a finalize path failed to
//! release cleanly.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use xg2g_adapters::{EventBus, Platform, Topic};
use xg2g_core::lifecycle::{Decision, LifecycleEvent};
use xg2g_core::{Clock, DetailCode, LeaseKey, ReasonCode, SessionId, SessionRecord, SessionState};
use xg2g_storage::{LeaseOutcome, Store};

use crate::config::OrchestratorConfig;
use crate::events::{SessionEvent, StopReason, StopSessionEvent};
use crate::lease::LeaseManager;
use crate::metrics::Metrics;

/// A session stuck in `Stopping` for longer than this is assumed to have
/// lost its handler (the process that would have finalized it is gone);
/// the sweeper force-terminalizes it rather than waiting forever.
const STUCK_STOP_THRESHOLD: Duration = Duration::from_secs(60);

/// TTL the recovery sweep's probe lease is acquired with; it only needs to
/// outlive the single acquire/release round trip below.
const RECOVERY_PROBE_TTL_MS: i64 = 1_000;

/// Recover sessions left mid-transition by a crash (spec §4.F "recovery
/// sweep"): any session in `Starting` or further whose last update predates
/// `leaseTTL` ago is a *candidate* — staleness alone proves nothing, since a
/// long-lived `Ready` session renews its lease on its own heartbeat
/// schedule, not on `updated_at_ms`. Before touching a candidate, the sweep
/// probes the lease key it should be holding with a short-lived probe
/// owner: only an actual `try_acquire_lease` *success* proves the previous
/// holder is dead, since the store's atomicity means a live holder's lease
/// can never be acquired out from under it. A probe that comes back `Busy`
/// (or errors) means the session is still live and is left alone.
/// `Starting` sessions (no pipeline resources committed yet) reset to `New`
/// for a fresh attempt; everything past that point is too far along to
/// safely resume and fails outright. Returns the number of sessions
/// touched.
pub fn recovery_sweep(store: &Store, lease_ttl: Duration, now_ms: i64) -> usize {
    let stale_after_ms = lease_ttl.as_millis() as i64;
    let mut touched = 0;

    for session in store.list_sessions() {
        if session.is_terminal() || session.state == SessionState::New {
            continue;
        }
        let age_ms = now_ms - session.updated_at_ms;
        if age_ms < stale_after_ms {
            continue;
        }

        let event = match session.state {
            SessionState::Starting => LifecycleEvent::RecoveryReset,
            SessionState::Priming | SessionState::Ready | SessionState::Draining | SessionState::Stopping => {
                LifecycleEvent::RecoveryFail
            }
            SessionState::Unknown | SessionState::New => continue,
            SessionState::Failed | SessionState::Cancelled | SessionState::Stopped => unreachable!("terminal excluded above"),
        };

        let Decision::Allowed(transition) = xg2g_core::lifecycle::decision_for(session.state, event) else {
            continue;
        };

        let sid = session.session_id.as_str();
        if !probe_lease_is_dead(store, &session, now_ms) {
            continue;
        }
        let from_state = session.state;
        let result = match event {
            LifecycleEvent::RecoveryReset => store.update_session_state(
                sid,
                transition.to,
                ReasonCode::None,
                DetailCode::None,
                None,
                now_ms,
            ),
            _ => store.update_session_state(
                sid,
                transition.to,
                ReasonCode::InvariantViolation,
                DetailCode::None,
                Some("recovered from a stale intermediate state at startup".to_string()),
                now_ms,
            ),
        };
        if result.is_ok() {
            let _ = store.set_context(sid, xg2g_core::session::KEY_RECOVERED, "true", now_ms);
            let _ = store.set_context(sid, xg2g_core::session::KEY_RECOVERED_FROM, from_state.as_str(), now_ms);
            touched += 1;
            tracing::warn!(session_id = sid, from = %from_state, to = %transition.to, "recovered stale session");
        }
    }

    touched
}

/// Probe the lease key `session` should be holding (its tuner slot if one
/// is recorded in `contextData`, else its service-ref dedup key) with a
/// short-lived probe owner. Only an `Acquired` outcome proves the previous
/// holder is actually dead; a `Busy` or error outcome means some process
/// still renews it, so the candidate is left alone. The probe lease is
/// released immediately on success, since its only purpose was the proof.
fn probe_lease_is_dead(store: &Store, session: &SessionRecord, now_ms: i64) -> bool {
    let sid = session.session_id.as_str();
    let key = match session.context_data.tuner_slot() {
        Some(slot) => LeaseKey::tuner(slot),
        None => LeaseKey::service(&session.service_ref),
    };
    let probe_owner = format!("recovery-probe:{sid}");
    match store.try_acquire_lease(&key, &probe_owner, RECOVERY_PROBE_TTL_MS, now_ms) {
        Ok(LeaseOutcome::Acquired(_)) => {
            let _ = store.release_lease(&key, &probe_owner);
            true
        }
        Ok(LeaseOutcome::Busy(_)) => false,
        Err(e) => {
            tracing::warn!(session_id = sid, error = %e, "recovery probe failed; leaving session alone");
            false
        }
    }
}

/// Release any lease a terminal session still appears to hold. A finalize
/// path that crashed after writing the terminal state but before releasing
/// leases would otherwise strand them until they expire on their own.
fn release_stray_leases<C: Clock>(lease_manager: &LeaseManager<C>, metrics: &Metrics, session: &SessionRecord) {
    let sid = session.session_id.as_str();
    if let Some(slot) = session.context_data.tuner_slot() {
        if let Some(lease) = lease_manager.get(&LeaseKey::tuner(slot)) {
            if lease.is_owned_by(sid) && lease_manager.release(&LeaseKey::tuner(slot), sid).is_ok() {
                metrics.dec_tuners_in_use();
            }
        }
    }
    let dedup_key = LeaseKey::service(&session.service_ref);
    if let Some(lease) = lease_manager.get(&dedup_key) {
        if lease.is_owned_by(sid) {
            let _ = lease_manager.release(&dedup_key, sid);
        }
    }
}

/// The periodic janitor (spec §4.F). Generic over the same clock and bus
/// types as the orchestrator it runs alongside, so a test can drive both
/// off one `FakeClock`.
pub struct Sweeper<C: Clock, B: EventBus<SessionEvent>> {
    store: Arc<Store>,
    platform: Arc<dyn Platform>,
    bus: Arc<B>,
    metrics: Arc<Metrics>,
    clock: C,
    config: OrchestratorConfig,
    /// Every stray-lease reclaim goes through here rather than `store`
    /// directly, so `now_ms` always comes from the injected clock.
    lease_manager: LeaseManager<C>,
}

impl<C: Clock + Clone + 'static, B: EventBus<SessionEvent> + 'static> Sweeper<C, B> {
    pub fn new(
        store: Arc<Store>,
        platform: Arc<dyn Platform>,
        bus: Arc<B>,
        metrics: Arc<Metrics>,
        clock: C,
        config: OrchestratorConfig,
    ) -> Self {
        let lease_manager = LeaseManager::new(store.clone(), clock.clone());
        Self { store, platform, bus, metrics, clock, config, lease_manager }
    }

    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()>
    where
        Self: Send + 'static,
    {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(self.config.sweeper.interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tick.tick() => {}
                }
                self.run_once();
            }
        })
    }

    /// One full pass: recovery, stuck-stop reaping, idle timeouts, terminal
    /// cleanup, lease reclamation, and the orphan-directory file scan.
    /// Exposed standalone so tests can drive a single deterministic pass
    /// without waiting on `spawn`'s interval.
    pub fn run_once(&self) {
        let now = self.clock.epoch_ms();

        let recovered = recovery_sweep(&self.store, self.config.lease_ttl, now);
        if recovered > 0 {
            tracing::info!(count = recovered, "periodic sweep recovered stale sessions");
        }

        self.reap_stuck_stops(now);
        self.reap_idle_sessions(now);
        self.reap_terminal_sessions(now);
        self.scan_for_orphans(now);
    }

    /// A session that has sat in `Stopping` past [`STUCK_STOP_THRESHOLD`]
    /// lost the handler that would have finalized it; force it to
    /// `Stopped` directly rather than leaving it to block a tuner slot
    /// forever.
    fn reap_stuck_stops(&self, now: i64) {
        for session in self.store.list_sessions() {
            if session.state != SessionState::Stopping {
                continue;
            }
            if now - session.updated_at_ms < STUCK_STOP_THRESHOLD.as_millis() as i64 {
                continue;
            }
            let sid = session.session_id.as_str();
            let result = self.store.update_session_state(
                sid,
                SessionState::Stopped,
                ReasonCode::IdleTimeout,
                DetailCode::SweeperForcedStopStuck,
                Some("stuck in Stopping past the force-stop threshold".to_string()),
                now,
            );
            if result.is_ok() {
                tracing::warn!(session_id = sid, "force-stopped a session stuck in Stopping");
                self.metrics.inc_session_end(ReasonCode::IdleTimeout, &session.profile.id);
                release_stray_leases(&self.lease_manager, &self.metrics, &session);
            }
        }
    }

    /// `Ready`/`Draining` sessions past `sweeper.idleTimeout` since their
    /// last client access get a synthetic stop published onto the normal
    /// stop topic, so they drain through the orchestrator's regular Stop
    /// handler (and its running handler's cancellation) rather than being
    /// force-terminalized here.
    fn reap_idle_sessions(&self, now: i64) {
        let Some(idle_timeout) = self.config.sweeper.idle_timeout else { return };
        let idle_ms = idle_timeout.as_millis() as i64;
        for session in self.store.list_sessions() {
            if !matches!(session.state, SessionState::Ready | SessionState::Draining) {
                continue;
            }
            let last_active = session.last_access_at_ms.unwrap_or(session.updated_at_ms);
            if now - last_active < idle_ms {
                continue;
            }
            self.bus.publish(
                Topic::StopSession,
                SessionEvent::Stop(StopSessionEvent {
                    session_id: session.session_id.clone(),
                    reason: StopReason::IdleTimeout,
                }),
            );
        }
    }

    /// Delete session records (and their on-disk artifacts) that have been
    /// terminal for longer than `sweeper.sessionRetention`, and reclaim any
    /// lease they still appear to hold.
    ///
    /// `Draining` is not terminal by `SessionState::is_terminal()` (spec §9
    /// open question (b): the engine treats it as non-terminal, but nothing
    /// ever transitions a session out of it once finalization writes it),
    /// so it is reaped here alongside the true terminal states on the same
    /// retention schedule — otherwise a completed VOD recording's record
    /// would never be deleted.
    fn reap_terminal_sessions(&self, now: i64) {
        let retention_ms = self.config.sweeper.session_retention.as_millis() as i64;
        for session in self.store.list_sessions() {
            if !session.is_terminal() && session.state != SessionState::Draining {
                continue;
            }
            if now - session.updated_at_ms < retention_ms {
                continue;
            }
            release_stray_leases(&self.lease_manager, &self.metrics, &session);
            self.remove_artifacts(session.session_id.as_str());
            let _ = self.store.delete_session(session.session_id.as_str());
        }
    }

    fn remove_artifacts(&self, session_id: &str) {
        if self.config.hls_root.is_none() {
            return;
        }
        if let Ok(dir) = self.platform.join(&["sessions", session_id]) {
            let platform = self.platform.clone();
            let dir2 = dir.clone();
            tokio::spawn(async move {
                let _ = platform.remove_all(&dir2).await;
            });
        }
    }

    /// Remove any `sessions/<id>` directory whose id either isn't a
    /// well-formed session id (never created by this process; spec §4.F
    /// "file scan") or no longer has a backing session record at all — a
    /// live session's directory is never touched, since its record's
    /// presence is exactly the signal that it is still in use. Detached via
    /// `tokio::spawn` since `run_once` itself stays synchronous; see
    /// `sweep_orphan_dirs` for the awaitable, directly-testable scan.
    fn scan_for_orphans(&self, now: i64) {
        if self.config.hls_root.is_none() {
            return;
        }
        let Ok(sessions_dir) = self.platform.join(&["sessions"]) else { return };
        let platform = self.platform.clone();
        let store = self.store.clone();
        let retention_ms = self.config.sweeper.effective_file_retention().as_millis() as i64;
        tokio::spawn(async move {
            sweep_orphan_dirs(platform, store, sessions_dir, now, retention_ms).await;
        });
    }
}

/// The orphan-directory scan itself (spec §4.F "file scan"), factored out
/// of `Sweeper::scan_for_orphans` so a test can await one deterministic
/// pass instead of relying on a detached `tokio::spawn` to complete.
/// A directory is removed only once it is both unsafe-or-recordless *and*
/// older than `retention_ms` by its last-modified time — a directory a
/// session just started writing into (record not committed yet, or the
/// write raced the scan) is given a grace window rather than deleted on
/// sight.
async fn sweep_orphan_dirs(
    platform: Arc<dyn Platform>,
    store: Arc<Store>,
    sessions_dir: std::path::PathBuf,
    now: i64,
    retention_ms: i64,
) {
    let Ok(names) = platform.list_dirs(&sessions_dir).await else { return };
    for name in names {
        let keep = SessionId::is_safe_session_id(&name) && store.get_session(&name).is_some();
        if keep {
            continue;
        }
        let Ok(dir) = platform.join(&["sessions", &name]) else { continue };
        let Ok(modified_at_ms) = platform.modified_at_ms(&dir).await else { continue };
        if now - modified_at_ms < retention_ms {
            continue;
        }
        let _ = platform.remove_all(&dir).await;
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;

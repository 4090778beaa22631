// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator (spec §4.E): admits, starts, heartbeats, stops, and
//! finalizes sessions against a capacity-bounded pool of tuner slots,
//! behind a single-writer guard lease.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use xg2g_adapters::{EventBus, MediaPipeline, Platform, PipelineHandle, Quality, SourceRef, StreamMode, StreamSpec, Subscription, Topic};
use xg2g_core::lifecycle::{decision_for, terminal_outcome, Cause, LifecycleEvent, Phase, StopIntent};
use xg2g_core::{Clock, DetailCode, LeaseKey, Mode, ReasonCode, SessionState};
use xg2g_storage::{LeaseOutcome, Store, StoreError};

use crate::active::ActiveMap;
use crate::classify::{classify_deadline_exceeded, classify_pipeline_error};
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::events::{SessionEvent, StartSessionEvent, StopReason, StopSessionEvent};
use crate::lease::LeaseManager;
use crate::metrics::Metrics;
use crate::playlist;
use crate::sweeper::{self, Sweeper};

/// Bounded wait for playlist readiness (spec §4.E step 8; spec §9 open
/// question (a) — treated as constants, see DESIGN.md).
const LIVE_WAIT: Duration = Duration::from_secs(60);
/// Shorter wait applied to sessions the sweeper marked `recovered` (spec §9
/// open question (a): "repair attempt" reading recorded in DESIGN.md).
const REPAIR_WAIT: Duration = Duration::from_secs(20);
const VOD_WAIT: Duration = Duration::from_secs(120);
const PLAYLIST_POLL_INTERVAL: Duration = Duration::from_millis(200);
const EXIT_WAIT_MIN_BACKOFF: Duration = Duration::from_millis(500);
const EXIT_WAIT_MAX_BACKOFF: Duration = Duration::from_secs(5);
/// Detached-but-bounded context for finalization/lease-release cleanup
/// (spec §5 "Cancellation & timeouts" item 2).
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives every in-flight session's lifecycle under capacity constraints
/// (spec §4.E). Generic over the bus implementation (only the in-process
/// `InMemoryBus` exists today, per spec §2.H) and the clock (so tests can
/// drive lease expiry deterministically).
pub struct Orchestrator<C: Clock, B: EventBus<SessionEvent>> {
    store: Arc<Store>,
    clock: C,
    bus: Arc<B>,
    pipeline: Arc<dyn MediaPipeline>,
    platform: Arc<dyn Platform>,
    metrics: Arc<Metrics>,
    active: Arc<ActiveMap>,
    config: OrchestratorConfig,
    /// Every lease acquire/renew/release goes through here rather than
    /// `store` directly, so `now_ms` always comes from the injected clock
    /// (spec §4.D).
    lease_manager: LeaseManager<C>,
    start_semaphore: Arc<Semaphore>,
    stop_semaphore: Arc<Semaphore>,
    /// Forced finalization causes set by a heartbeat loss, keyed by
    /// session id (spec §4.E step 5: "transition the session to
    /// Terminalize with cause LeaseExpired and cancel the handler's
    /// context").
    forced_cause: Mutex<HashMap<String, Cause>>,
}

impl<C: Clock + Clone + 'static, B: EventBus<SessionEvent> + 'static> Orchestrator<C, B> {
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<Store>,
        clock: C,
        bus: Arc<B>,
        pipeline: Arc<dyn MediaPipeline>,
        platform: Arc<dyn Platform>,
        metrics: Arc<Metrics>,
    ) -> Result<Arc<Self>, OrchestratorError> {
        config.validate()?;
        let lease_manager = LeaseManager::new(store.clone(), clock.clone());
        Ok(Arc::new(Self {
            start_semaphore: Arc::new(Semaphore::new(config.start_concurrency)),
            stop_semaphore: Arc::new(Semaphore::new(config.stop_concurrency)),
            active: Arc::new(ActiveMap::new()),
            forced_cause: Mutex::new(HashMap::new()),
            lease_manager,
            store,
            clock,
            bus,
            pipeline,
            platform,
            metrics,
            config,
        }))
    }

    fn now_ms(&self) -> i64 {
        self.clock.epoch_ms()
    }

    /// Run the full startup sequence (spec §4.E) and then the event loop,
    /// until `shutdown` is cancelled or a fatal error occurs.
    pub async fn run(self: &Arc<Self>, shutdown: CancellationToken) -> Result<(), OrchestratorError> {
        // Step 1: subscribe before anything else can publish.
        let mut start_sub = self.bus.subscribe(Topic::StartSession);
        let mut stop_sub = self.bus.subscribe(Topic::StopSession);

        // Step 2: acquire the guard lease; refuse to start on split-brain.
        self.acquire_guard_or_fail()?;

        // Step 3: DeleteAll is safe only because the guard is held; then
        // re-acquire it immediately.
        self.lease_manager.delete_all()?;
        self.acquire_guard_or_fail()?;

        // Step 4: guard maintainer, renewal loss is fatal.
        let guard_failure = Arc::new(tokio::sync::Notify::new());
        let guard_task = self.spawn_guard_maintainer(shutdown.clone(), guard_failure.clone());

        // Step 5: recovery sweep.
        let recovered = sweeper::recovery_sweep(&self.store, self.config.lease_ttl, self.now_ms());
        tracing::info!(count = recovered, "recovery sweep complete");

        // Step 6: reconcile the tuner gauge from store truth.
        self.reconcile_tuner_gauge();

        // Step 7: launch the sweeper.
        let sweeper = Sweeper::new(
            self.store.clone(),
            self.platform.clone(),
            self.bus.clone(),
            self.metrics.clone(),
            self.clock.clone(),
            self.config.clone(),
        );
        let sweeper_task = sweeper.spawn(shutdown.clone());

        tracing::info!(owner = %self.config.owner, "orchestrator started");

        // Step 8: event loop.
        let result = self.event_loop(&mut start_sub, &mut stop_sub, shutdown.clone(), guard_failure).await;

        shutdown.cancel();
        guard_task.abort();
        sweeper_task.abort();
        result
    }

    fn acquire_guard_or_fail(&self) -> Result<(), OrchestratorError> {
        let key = LeaseKey::guard_lock();
        match self.lease_manager.try_acquire(&key, &self.config.owner, self.config.lease_ttl)? {
            LeaseOutcome::Acquired(_) => Ok(()),
            LeaseOutcome::Busy(lease) => Err(OrchestratorError::GuardLost { holder: lease.owner }),
        }
    }

    fn spawn_guard_maintainer(
        self: &Arc<Self>,
        shutdown: CancellationToken,
        failure: Arc<tokio::sync::Notify>,
    ) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let key = LeaseKey::guard_lock();
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(this.config.heartbeat_every) => {}
                }
                let renewed = this.lease_manager.renew(&key, &this.config.owner, this.config.lease_ttl);
                if renewed.is_err() {
                    tracing::error!("guard lease lost; stopping the line");
                    failure.notify_one();
                    return;
                }
            }
        })
    }

    /// Gauge reconciliation (spec §4.E step 6): count non-terminal
    /// sessions whose `contextData.tuner_slot` agrees with a live lease
    /// they own. Divergent (drift) sessions are excluded, per spec §3
    /// invariant 2.
    fn reconcile_tuner_gauge(&self) {
        let now = self.now_ms();
        let mut count = 0u64;
        for session in self.store.list_sessions() {
            if session.is_terminal() {
                continue;
            }
            let Some(slot) = session.context_data.tuner_slot() else { continue };
            let key = LeaseKey::tuner(slot);
            if let Some(lease) = self.lease_manager.get(&key) {
                if !lease.is_expired(now) && lease.is_owned_by(session.session_id.as_str()) {
                    count += 1;
                }
            }
        }
        self.metrics.set_tuners_in_use(count);
    }

    async fn event_loop(
        self: &Arc<Self>,
        start_sub: &mut B::Sub,
        stop_sub: &mut B::Sub,
        shutdown: CancellationToken,
        guard_failure: Arc<tokio::sync::Notify>,
    ) -> Result<(), OrchestratorError> {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = guard_failure.notified() => {
                    return Err(OrchestratorError::GuardLost { holder: self.config.owner.clone() });
                }
                event = start_sub.recv() => {
                    let Some(SessionEvent::Start(event)) = event else { continue };
                    // Acquire the semaphore slot at the publish side, per
                    // spec §4.E "concurrency bounds and semantics" —
                    // cancellation always preempts this block.
                    let permit = tokio::select! {
                        _ = shutdown.cancelled() => return Ok(()),
                        permit = self.start_semaphore.clone().acquire_owned() => permit,
                    };
                    let Ok(permit) = permit else { continue };
                    let this = self.clone();
                    let child = shutdown.child_token();
                    tokio::spawn(async move {
                        this.handle_start(event, child).await;
                        drop(permit);
                    });
                }
                event = stop_sub.recv() => {
                    let Some(SessionEvent::Stop(event)) = event else { continue };
                    let permit = tokio::select! {
                        _ = shutdown.cancelled() => return Ok(()),
                        permit = self.stop_semaphore.clone().acquire_owned() => permit,
                    };
                    let Ok(permit) = permit else { continue };
                    let this = self.clone();
                    tokio::spawn(async move {
                        this.handle_stop(event);
                        drop(permit);
                    });
                }
            }
        }
    }

    // ---- stop handler --------------------------------------------------

    /// Spec §4.E "Stop handler".
    pub fn handle_stop(self: &Arc<Self>, event: StopSessionEvent) {
        let sid = event.session_id.as_str().to_string();
        let now = self.now_ms();
        let Some(session) = self.store.get_session(&sid) else {
            tracing::warn!(session_id = %sid, "stop for unknown session");
            return;
        };
        if session.is_terminal() {
            return;
        }

        // A session still in New never started a handler for the active
        // map to cancel, so it is terminalized directly here rather than
        // through StopRequested/Stopping.
        if session.state == SessionState::New {
            let reason = match event.reason {
                StopReason::IdleTimeout => ReasonCode::IdleTimeout,
                StopReason::ClientStop => ReasonCode::ClientStop,
            };
            let _ = self.store.update_session_state(&sid, SessionState::Stopped, reason, DetailCode::None, None, now);
            self.release_all_leases(&sid, &session);
            return;
        }

        let stop_reason_tag = match event.reason {
            StopReason::IdleTimeout => xg2g_core::session::STOP_REASON_IDLE_TIMEOUT,
            StopReason::ClientStop => xg2g_core::session::STOP_REASON_CLIENT_STOP,
        };
        let _ = self.store.set_context(&sid, xg2g_core::session::KEY_STOP_REASON, stop_reason_tag, now);

        if let Err(e) = self.apply_transition(&sid, LifecycleEvent::StopRequested, now) {
            tracing::error!(session_id = %sid, error = %e, "illegal StopRequested transition");
            return;
        }
        let _ = self.store.set_pipeline_state(&sid, xg2g_core::PipelineState::StopRequested, now);
        self.active.cancel(&sid);
    }

    // ---- start handler --------------------------------------------------

    /// Spec §4.E "Start handler", steps 1-10, followed by the deferred
    /// finalizer.
    async fn handle_start(self: &Arc<Self>, event: StartSessionEvent, parent: CancellationToken) {
        let sid = event.session_id.as_str().to_string();
        let span = tracing::info_span!("start_session", session_id = %sid, correlation_id = %event.correlation_id);
        let this = self.clone();
        async move {
            let token = this.active.register(&sid);
            // Forward orchestrator shutdown onto this handler's own token,
            // the same one a Stop event would cancel.
            let forwarded = token.clone();
            let forward = tokio::spawn(async move {
                parent.cancelled().await;
                forwarded.cancel();
            });
            let result = this.run_start(&event, &token).await;
            forward.abort();
            this.finalize(&sid, result).await;
            this.active.deregister(&sid);
        }
        .instrument(span)
        .await;
    }

    /// Returns the `(Phase, Cause)` the handler ended on. Finalization
    /// reads the current store state to decide `stopIntent` (spec §9:
    /// "stop wins over cancel" is resolved by the Stop handler having
    /// already written `Stopping` to the store before cancelling the
    /// token).
    async fn run_start(
        &self,
        event: &StartSessionEvent,
        token: &CancellationToken,
    ) -> (Phase, Cause) {
        let sid = event.session_id.as_str().to_string();
        let now = self.now_ms();

        let Some(session) = self.store.get_session(&sid) else {
            tracing::error!(session_id = %sid, "start for unknown session");
            return (
                Phase::Start,
                Cause::Classified(ReasonCode::NotFound, DetailCode::None, Some("start for unknown session".to_string())),
            );
        };
        let mode = session.mode().unwrap_or(Mode::Live);
        let is_vod = session.profile.is_vod;
        let service_ref = session.service_ref.clone();
        let profile_id = session.profile.id.clone();

        // Step 3: dedup + tuner leases (LIVE only).
        let mut tuner_slot: Option<u32> = None;
        if mode == Mode::Live {
            let dedup_key = (self.config.lease_key_func)(event);
            match self.lease_manager.try_acquire(&dedup_key, &sid, self.config.lease_ttl) {
                Ok(LeaseOutcome::Acquired(_)) => {}
                Ok(LeaseOutcome::Busy(_)) => {
                    return (
                        Phase::Start,
                        Cause::Classified(ReasonCode::LeaseBusy, DetailCode::None, Some("dedup lease held".to_string())),
                    );
                }
                Err(e) => {
                    tracing::error!(session_id = %sid, error = %e, "store error acquiring dedup lease");
                    return (Phase::Start, Cause::Classified(ReasonCode::Unknown, DetailCode::None, Some(e.to_string())));
                }
            }

            for &slot in &self.config.tuner_slots {
                let key = LeaseKey::tuner(slot);
                match self.lease_manager.try_acquire(&key, &sid, self.config.lease_ttl) {
                    Ok(LeaseOutcome::Acquired(_)) => {
                        tuner_slot = Some(slot);
                        break;
                    }
                    Ok(LeaseOutcome::Busy(_)) => continue,
                    Err(_) => continue,
                }
            }
            if tuner_slot.is_none() {
                self.metrics.inc_tuner_busy();
                let _ = self.lease_manager.release(&dedup_key, &sid);
                return (
                    Phase::Start,
                    Cause::Classified(ReasonCode::LeaseBusy, DetailCode::None, Some("no tuner slots available".to_string())),
                );
            }
            self.metrics.inc_tuners_in_use();
        }

        if let Some(slot) = tuner_slot {
            let _ = self.store.set_context(&sid, xg2g_core::session::KEY_TUNER_SLOT, slot.to_string(), now);
        }

        // Step 5: tuner-lease heartbeat (LIVE only — only LIVE sessions
        // hold a tuner lease to heartbeat).
        let heartbeat_task = tuner_slot.map(|slot| self.spawn_heartbeat(sid.clone(), slot, token.clone()));

        // Step 6: Starting.
        if let Err(e) = self.apply_transition(&sid, LifecycleEvent::StartRequested, now) {
            tracing::error!(session_id = %sid, error = %e, "illegal StartRequested transition");
            if let Some(h) = heartbeat_task { h.abort(); }
            return (
                Phase::Start,
                Cause::Classified(ReasonCode::InternalInvariantBreach, DetailCode::InternalInvariantBreach, Some(e.to_string())),
            );
        }

        // Step 7: invoke the media pipeline.
        let spec = StreamSpec {
            session_id: sid.clone(),
            mode: match mode { Mode::Live => StreamMode::Live, Mode::Recording => StreamMode::Recording },
            output_format: "hls".to_string(),
            source: tuner_slot.map(SourceRef::TunerSlot).unwrap_or(SourceRef::Url(service_ref.clone())),
            quality: Quality { codec: session.profile.codec.clone(), quality: session.profile.quality.clone() },
        };

        let start_result = tokio::select! {
            _ = token.cancelled() => None,
            result = self.pipeline.start(&spec) => Some(result),
        };
        let handle = match start_result {
            None => {
                if let Some(h) = heartbeat_task { h.abort(); }
                return (Phase::Start, Cause::ContextCancelled);
            }
            Some(Ok(handle)) => handle,
            Some(Err(e)) => {
                if let Some(h) = heartbeat_task { h.abort(); }
                let c = classify_pipeline_error(&e);
                return (Phase::Start, Cause::Classified(c.reason, c.detail, Some(c.debug)));
            }
        };

        // Step 8: Priming + playlist wait.
        if let Err(e) = self.apply_transition(&sid, LifecycleEvent::PrimingStarted, self.now_ms()) {
            tracing::error!(session_id = %sid, error = %e, "illegal PrimingStarted transition");
            if let Some(h) = heartbeat_task { h.abort(); }
            return (
                Phase::Start,
                Cause::Classified(ReasonCode::InternalInvariantBreach, DetailCode::InternalInvariantBreach, Some(e.to_string())),
            );
        }

        let start_ms = self.now_ms();
        if let Some(root) = self.config.hls_root.clone() {
            let recovered = session.context_data.get(xg2g_core::session::KEY_RECOVERED).is_some();
            let wait = if is_vod { VOD_WAIT } else if recovered { REPAIR_WAIT } else { LIVE_WAIT };
            let wait_result = tokio::select! {
                _ = token.cancelled() => None,
                r = self.wait_for_playlist(&sid, &root, is_vod, &handle, wait) => Some(r),
            };
            match wait_result {
                None => {
                    if let Some(h) = heartbeat_task { h.abort(); }
                    self.stop_pipeline(&handle).await;
                    return (Phase::Start, Cause::ContextCancelled);
                }
                Some(Err(cause)) => {
                    if let Some(h) = heartbeat_task { h.abort(); }
                    self.stop_pipeline(&handle).await;
                    return (Phase::Start, cause);
                }
                Some(Ok(())) => {}
            }
        }

        // Step 9: Ready.
        let ready_now = self.now_ms();
        if let Err(e) = self.apply_transition(&sid, LifecycleEvent::Ready, ready_now) {
            tracing::error!(session_id = %sid, error = %e, "illegal Ready transition");
            if let Some(h) = heartbeat_task { h.abort(); }
            self.stop_pipeline(&handle).await;
            return (
                Phase::Start,
                Cause::Classified(ReasonCode::InternalInvariantBreach, DetailCode::InternalInvariantBreach, Some(e.to_string())),
            );
        }
        let _ = self.store.mark_playlist_published(&sid, ready_now);
        let _ = self.store.touch_session(&sid, ready_now);
        self.metrics.observe_ttfp(&profile_id, (ready_now - start_ms).max(0) as u64);
        if mode == Mode::Live {
            let dedup_key = (self.config.lease_key_func)(event);
            let _ = self.lease_manager.release(&dedup_key, &sid);
        }

        // Step 10: exit-wait loop.
        let cause = self.exit_wait(&handle, token).await;
        if let Some(h) = heartbeat_task { h.abort(); }
        self.stop_pipeline(&handle).await;

        let phase = if is_vod && matches!(&cause, Cause::CleanCompletion) { Phase::VODComplete } else { Phase::Running };
        (phase, cause)
    }

    /// Tears down the pipeline for `handle`, bounded by `pipeline_stop_timeout`
    /// (spec §4.E). A stop that outlives the deadline is logged; an inner
    /// `PipelineError` (e.g. the handle already vanished because the process
    /// exited on its own) is not treated as a failure worth surfacing.
    async fn stop_pipeline(&self, handle: &PipelineHandle) {
        match tokio::time::timeout(self.config.pipeline_stop_timeout, self.pipeline.stop(handle)).await {
            Ok(_) => {}
            Err(_) => {
                tracing::warn!(handle = %handle, "pipeline stop timed out");
            }
        }
    }

    async fn wait_for_playlist(
        &self,
        sid: &str,
        hls_root: &std::path::Path,
        is_vod: bool,
        handle: &PipelineHandle,
        timeout: Duration,
    ) -> Result<(), Cause> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.pipeline.health(handle).await {
                Ok(h) if !h.healthy => {
                    return Err(Cause::Classified(
                        ReasonCode::ProcessEnded,
                        DetailCode::None,
                        Some("pipeline reported unhealthy while waiting for playlist".to_string()),
                    ));
                }
                Err(e) => {
                    return Err(Cause::Classified(
                        ReasonCode::ProcessEnded,
                        DetailCode::None,
                        Some(format!("pipeline health check failed: {e}")),
                    ));
                }
                Ok(_) => {}
            }
            match playlist::is_ready(self.platform.as_ref(), hls_root, sid, is_vod).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(_) => {}
            }
            if tokio::time::Instant::now() >= deadline {
                let elapsed = classify_deadline_exceeded(make_elapsed().await);
                return Err(Cause::Classified(elapsed.reason, elapsed.detail, Some(elapsed.debug)));
            }
            tokio::time::sleep(PLAYLIST_POLL_INTERVAL).await;
        }
    }

    async fn exit_wait(&self, handle: &PipelineHandle, token: &CancellationToken) -> Cause {
        let mut backoff = EXIT_WAIT_MIN_BACKOFF;
        loop {
            tokio::select! {
                _ = token.cancelled() => return Cause::ContextCancelled,
                _ = tokio::time::sleep(backoff) => {}
            }
            match self.pipeline.health(handle).await {
                Ok(h) if h.healthy => {
                    backoff = (backoff * 2).min(EXIT_WAIT_MAX_BACKOFF);
                }
                Ok(h) => {
                    let _ = h;
                    return Cause::CleanCompletion;
                }
                Err(e) => {
                    let c = classify_pipeline_error(&e);
                    return Cause::Classified(c.reason, c.detail, Some(c.debug));
                }
            }
        }
    }

    fn spawn_heartbeat(self: &Arc<Self>, sid: String, slot: u32, token: CancellationToken) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let key = LeaseKey::tuner(slot);
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(this.config.heartbeat_every) => {}
                }
                let renewed = this.lease_manager.renew(&key, &sid, this.config.lease_ttl);
                let not_owner = matches!(
                    this.lease_manager.get(&key),
                    Some(lease) if !lease.is_owned_by(&sid)
                );
                if renewed.is_err() || not_owner {
                    tracing::warn!(session_id = %sid, slot, "tuner lease heartbeat lost");
                    this.forced_cause.lock().insert(
                        sid.clone(),
                        Cause::Classified(
                            ReasonCode::LeaseExpired,
                            DetailCode::None,
                            Some("tuner lease heartbeat lost".to_string()),
                        ),
                    );
                    token.cancel();
                    return;
                }
            }
        })
    }

    // ---- finalization ---------------------------------------------------

    /// Spec §4.E "Finalization": runs unconditionally after a Start
    /// handler returns, under a detached-but-bounded timeout.
    async fn finalize(self: &Arc<Self>, sid: &str, (phase, cause): (Phase, Cause)) {
        let this = self.clone();
        let sid = sid.to_string();
        let work = async move {
            let cause = this.forced_cause.lock().remove(&sid).unwrap_or(cause);
            let now = this.now_ms();
            let Some(session) = this.store.get_session(&sid) else { return };
            if session.is_terminal() {
                return;
            }
            let stop_intent = StopIntent::from(session.state == SessionState::Stopping);
            let stop_reason = match session.context_data.get(xg2g_core::session::KEY_STOP_REASON) {
                Some(xg2g_core::session::STOP_REASON_IDLE_TIMEOUT) => ReasonCode::IdleTimeout,
                _ => ReasonCode::ClientStop,
            };
            let outcome = terminal_outcome(stop_intent, stop_reason, phase, cause);
            let _ = this.store.update_session_state(
                &sid,
                outcome.state,
                outcome.reason,
                outcome.detail,
                outcome.detail_debug.clone(),
                now,
            );

            let is_vod_clean = outcome.state == SessionState::Draining;
            if !is_vod_clean && this.config.hls_root.is_some() {
                if let Ok(dir) = this.platform.join(&["sessions", &sid]) {
                    let _ = tokio::time::timeout(FINALIZE_TIMEOUT, this.platform.remove_all(&dir)).await;
                }
            }

            this.metrics.inc_session_end(outcome.reason, &session.profile.id);
            this.release_all_leases(&sid, &session);
        };
        let _ = tokio::time::timeout(FINALIZE_TIMEOUT, work).await;
    }

    fn release_all_leases(&self, sid: &str, session: &xg2g_core::SessionRecord) {
        if let Some(slot) = session.context_data.tuner_slot() {
            if self.lease_manager.release(&LeaseKey::tuner(slot), sid).is_ok() {
                self.metrics.dec_tuners_in_use();
            }
        }
        let dedup_key = LeaseKey::service(&session.service_ref);
        let _ = self.lease_manager.release(&dedup_key, sid);
    }

    /// Validate a (state, event) transition through the lifecycle engine
    /// and persist it; a forbidden decision forces the session to
    /// `Failed/InternalInvariantBreach` (spec §4.B "Illegal transition
    /// policy").
    fn apply_transition(&self, sid: &str, event: LifecycleEvent, now: i64) -> Result<(), StoreError> {
        let Some(session) = self.store.get_session(sid) else {
            return Err(StoreError::SessionNotFound(sid.to_string()));
        };
        match decision_for(session.state, event) {
            xg2g_core::lifecycle::Decision::Allowed(t) => {
                self.store.update_session_state(sid, t.to, ReasonCode::None, DetailCode::None, None, now)
            }
            xg2g_core::lifecycle::Decision::Forbidden(_) => {
                let _ = self.store.update_session_state(
                    sid,
                    SessionState::Failed,
                    ReasonCode::InternalInvariantBreach,
                    DetailCode::InternalInvariantBreach,
                    Some(format!("illegal transition: {:?} at {:?}", event, session.state)),
                    now,
                );
                Err(StoreError::SessionTerminal(sid.to_string()))
            }
        }
    }

}

/// Helper shim so `classify_deadline_exceeded` (which expects a real
/// `tokio::time::error::Elapsed`) can be driven from a synthetic timeout.
async fn make_elapsed() -> tokio::time::error::Elapsed {
    match tokio::time::timeout(Duration::from_millis(0), std::future::pending::<()>()).await {
        Err(elapsed) => elapsed,
        Ok(()) => unreachable!("pending future never resolves"),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

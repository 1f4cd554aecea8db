// Session engine: login state machine, background health/refresh timers and the request gate.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::auth::Authenticator;
use super::health::{HealthMonitor, ProbeOutcome};
use super::refresh::{MetadataKind, MetadataRefresher};
use super::state::{Phase, SessionState};
use super::stats::{StatsCollector, StatsSnapshot};
use crate::config::{ConnectionOptions, SessionTimings};
use crate::error::Result;
use crate::transport::http_transport::HttpTransport;
use crate::transport::traits::Transport;

pub struct SessionEngine {
    options: ConnectionOptions,
    timings: SessionTimings,
    transport: Arc<dyn Transport>,
    phase: watch::Sender<Phase>,
    state: RwLock<SessionState>,
    stats: StatsCollector,
    /// Held for the whole of one authentication run.
    auth_lock: Mutex<()>,
    /// Attempt number of the most recent authentication run.
    last_attempt: AtomicU32,
    /// Bumped by every authentication run; a pending retry only fires if
    /// the epoch it captured is still current.
    retry_epoch: AtomicU64,
    health_armed: AtomicBool,
    settings_armed: AtomicBool,
    channels_armed: AtomicBool,
    shutdown_token: CancellationToken,
    weak_self: Weak<SessionEngine>,
}

impl SessionEngine {
    /// Create an engine talking to the server over HTTPS.
    pub fn new(options: ConnectionOptions, timings: SessionTimings) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(&options, timings.request_timeout())?;
        Ok(Self::with_transport(options, timings, Arc::new(transport)))
    }

    pub fn with_transport(
        options: ConnectionOptions,
        timings: SessionTimings,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Arc::new_cyclic(|weak_self| Self {
            options,
            timings,
            transport,
            phase,
            state: RwLock::new(SessionState::new()),
            stats: StatsCollector::new(),
            auth_lock: Mutex::new(()),
            last_attempt: AtomicU32::new(0),
            retry_epoch: AtomicU64::new(0),
            health_armed: AtomicBool::new(false),
            settings_armed: AtomicBool::new(false),
            channels_armed: AtomicBool::new(false),
            shutdown_token: CancellationToken::new(),
            weak_self: weak_self.clone(),
        })
    }

    /// Log in, then load settings and channels and arm the background timers.
    ///
    /// Waits for an authentication already in flight before starting its own
    /// run. On failure the error is returned and a retry is scheduled after
    /// the fixed backoff; retries continue until one succeeds or the engine
    /// is shut down.
    pub async fn authenticate(&self) -> Result<String> {
        let _guard = self.auth_lock.lock().await;
        self.authenticate_locked(0).await
    }

    /// Background trigger: skipped when another authentication is running.
    fn trigger_authentication(&self, attempt: u32) -> BoxFuture<'_, ()> {
        async move {
            let _guard = match self.auth_lock.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!(
                        "auth for {} already in flight, skipping attempt {}",
                        self.options.host, attempt
                    );
                    return;
                }
            };
            // Failures are logged and rescheduled inside the run.
            let _ = self.authenticate_locked(attempt).await;
        }
        .boxed()
    }

    async fn authenticate_locked(&self, attempt: u32) -> Result<String> {
        self.retry_epoch.fetch_add(1, Ordering::SeqCst);
        self.last_attempt.store(attempt, Ordering::SeqCst);
        self.stats.record_auth_attempt();
        debug!("start auth for {}, attempt: {}", self.options.host, attempt);
        self.phase.send_replace(Phase::Authenticating);

        let sid = match Authenticator::authenticate(
            self.transport.as_ref(),
            &self.options.login,
            &self.options.password,
        )
        .await
        {
            Ok(sid) => sid,
            Err(e) => {
                self.state.write().clear_token();
                self.phase.send_replace(Phase::AuthFailed);
                self.stats.record_auth_failure();
                error!(
                    "auth failed for {}, attempt {}: {}",
                    self.options.host, attempt, e
                );
                self.schedule_retry(attempt.saturating_add(1));
                return Err(e);
            }
        };

        self.state.write().set_token(sid.clone());
        self.phase.send_replace(Phase::Authenticated);
        self.stats.record_login();
        info!("auth success for {}, attempt {}", self.options.host, attempt);

        self.arm_health_timer();

        // Login, settings, channels and timer arming run strictly in order.
        let loaded = match self.fetch_settings().await {
            Ok(_) => self.fetch_channels().await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = loaded {
            error!(
                "initial metadata load failed for {}, attempt {}: {}",
                self.options.host, attempt, e
            );
            self.schedule_retry(attempt.saturating_add(1));
            return Err(e);
        }

        self.arm_refresh_timers();
        Ok(sid)
    }

    fn schedule_retry(&self, attempt: u32) {
        let epoch = self.retry_epoch.load(Ordering::SeqCst);
        let delay = self.timings.retry_delay();
        let weak = self.weak_self.clone();
        let cancel = self.shutdown_token.clone();
        debug!(
            "auth retry for {} scheduled in {:?}, attempt {}",
            self.options.host, delay, attempt
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            let Some(engine) = weak.upgrade() else {
                return;
            };
            if engine.retry_epoch.load(Ordering::SeqCst) != epoch {
                debug!("auth retry attempt {} superseded", attempt);
                return;
            }
            engine.trigger_authentication(attempt).await;
        });
    }

    fn arm_health_timer(&self) {
        if self.health_armed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stats.record_timer_armed();
        self.spawn_periodic("health", self.timings.health_interval(), |engine| async move {
            engine.check_health().await;
        });
    }

    fn arm_refresh_timers(&self) {
        if !self.settings_armed.swap(true, Ordering::SeqCst) {
            self.stats.record_timer_armed();
            self.spawn_periodic(
                "settings",
                self.timings.settings_refresh(),
                |engine| async move {
                    if let Err(e) = engine.fetch_settings().await {
                        warn!("settings refresh failed for {}: {}", engine.options.host, e);
                    }
                },
            );
        }
        if !self.channels_armed.swap(true, Ordering::SeqCst) {
            self.stats.record_timer_armed();
            self.spawn_periodic(
                "channels",
                self.timings.channels_refresh(),
                |engine| async move {
                    if let Err(e) = engine.fetch_channels().await {
                        warn!("channels refresh failed for {}: {}", engine.options.host, e);
                    }
                },
            );
        }
    }

    /// Run `tick` every `period`, first after one full period, until shutdown
    /// or until the engine is dropped.
    fn spawn_periodic<F, Fut>(&self, name: &'static str, period: Duration, tick: F)
    where
        F: Fn(Arc<SessionEngine>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let weak = self.weak_self.clone();
        let cancel = self.shutdown_token.clone();
        debug!("{} timer armed for {}, every {:?}", name, self.options.host, period);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("{} timer cancelled", name);
                        return;
                    }
                    _ = interval.tick() => {}
                }
                let Some(engine) = weak.upgrade() else {
                    return;
                };
                tick(engine).await;
            }
        });
    }

    async fn check_health(&self) {
        self.stats.record_probe();
        let result = match self.gate() {
            Ok(token) => HealthMonitor::probe(self.transport.as_ref(), &token).await,
            Err(e) => Err(e),
        };

        match HealthMonitor::classify(result) {
            ProbeOutcome::Alive => {
                debug!("health ok for {}", self.options.host);
            }
            ProbeOutcome::SessionLost => {
                warn!("session lost for {}, re-authenticating", self.options.host);
                self.stats.record_session_loss();
                self.trigger_authentication(0).await;
            }
            ProbeOutcome::Failed(e) => {
                error!("health check failed for {}: {}", self.options.host, e);
                let next = self.last_attempt.load(Ordering::SeqCst).saturating_add(1);
                self.trigger_authentication(next).await;
            }
        }
    }

    /// The request gate. Yields the current token while authenticated.
    pub(crate) fn gate(&self) -> Result<String> {
        let phase = *self.phase.borrow();
        self.state.read().gate(phase)
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn state(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Resolve once the engine reaches `phase`.
    pub async fn wait_for(&self, phase: Phase) {
        let mut rx = self.phase.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|current| *current == phase).await;
    }

    /// Attempt number of the most recent authentication run.
    pub fn attempt(&self) -> u32 {
        self.last_attempt.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token().map(str::to_string)
    }

    pub fn settings(&self) -> Map<String, Value> {
        self.state.read().settings().clone()
    }

    pub fn channels(&self) -> Map<String, Value> {
        self.state.read().channels().clone()
    }

    pub async fn fetch_settings(&self) -> Result<Map<String, Value>> {
        self.fetch_metadata(MetadataKind::Settings).await
    }

    pub async fn fetch_channels(&self) -> Result<Map<String, Value>> {
        self.fetch_metadata(MetadataKind::Channels).await
    }

    async fn fetch_metadata(&self, kind: MetadataKind) -> Result<Map<String, Value>> {
        let token = self.gate()?;
        let snapshot = MetadataRefresher::fetch(self.transport.as_ref(), kind, &token).await?;
        {
            let mut state = self.state.write();
            match kind {
                MetadataKind::Settings => state.replace_settings(snapshot.clone()),
                MetadataKind::Channels => state.replace_channels(snapshot.clone()),
            }
        }
        match kind {
            MetadataKind::Settings => self.stats.record_settings_fetch(),
            MetadataKind::Channels => self.stats.record_channels_fetch(),
        }
        debug!("{} fetched for {}: {} keys", kind, self.options.host, snapshot.len());
        Ok(snapshot)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Cancel every timer and pending retry. In-flight requests run to completion.
    pub fn shutdown(&self) {
        if !self.shutdown_token.is_cancelled() {
            info!("session engine for {} shutting down", self.options.host);
        }
        self.shutdown_token.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }
}

impl Drop for SessionEngine {
    fn drop(&mut self) {
        debug!("SessionEngine {} dropped, cancelling timers", self.options.host);
        self.shutdown_token.cancel();
    }
}


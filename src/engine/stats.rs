// Live statistics aggregation: authentication attempts, probes, refreshes, armed timers.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub auth_attempts: u64,
    pub auth_failures: u64,
    pub probes: u64,
    pub session_losses: u64,
    pub settings_fetches: u64,
    pub channels_fetches: u64,
    pub timers_armed: u32,
    /// Seconds since the last successful login, if any.
    pub session_age_secs: Option<u64>,
}

pub struct StatsCollector {
    auth_attempts: AtomicU64,
    auth_failures: AtomicU64,
    probes: AtomicU64,
    session_losses: AtomicU64,
    settings_fetches: AtomicU64,
    channels_fetches: AtomicU64,
    timers_armed: AtomicU32,
    last_login: Mutex<Option<Instant>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            auth_attempts: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            probes: AtomicU64::new(0),
            session_losses: AtomicU64::new(0),
            settings_fetches: AtomicU64::new(0),
            channels_fetches: AtomicU64::new(0),
            timers_armed: AtomicU32::new(0),
            last_login: Mutex::new(None),
        }
    }

    pub fn record_auth_attempt(&self) {
        self.auth_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_login(&self) {
        *self.last_login.lock() = Some(Instant::now());
    }

    pub fn record_probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_loss(&self) {
        self.session_losses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settings_fetch(&self) {
        self.settings_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_channels_fetch(&self) {
        self.channels_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timer_armed(&self) {
        self.timers_armed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let session_age_secs = self
            .last_login
            .lock()
            .map(|at| at.elapsed().as_secs());

        StatsSnapshot {
            auth_attempts: self.auth_attempts.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            session_losses: self.session_losses.load(Ordering::Relaxed),
            settings_fetches: self.settings_fetches.load(Ordering::Relaxed),
            channels_fetches: self.channels_fetches.load(Ordering::Relaxed),
            timers_armed: self.timers_armed.load(Ordering::Relaxed),
            session_age_secs,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = StatsCollector::new();
        assert!(stats.snapshot().session_age_secs.is_none());

        stats.record_auth_attempt();
        stats.record_auth_attempt();
        stats.record_auth_failure();
        stats.record_login();
        stats.record_probe();
        stats.record_settings_fetch();
        stats.record_channels_fetch();
        stats.record_channels_fetch();
        stats.record_timer_armed();

        let snap = stats.snapshot();
        assert_eq!(snap.auth_attempts, 2);
        assert_eq!(snap.auth_failures, 1);
        assert_eq!(snap.probes, 1);
        assert_eq!(snap.session_losses, 0);
        assert_eq!(snap.settings_fetches, 1);
        assert_eq!(snap.channels_fetches, 2);
        assert_eq!(snap.timers_armed, 1);
        assert_eq!(snap.session_age_secs, Some(0));
    }
}

use crate::prelude::*;
use crate::coordinator::{commands::read::ReadDevice, Coordinator};
use crate::cycle::{CycleState, PollCycle, Stage};
use crate::snapshot::{Section, SnapshotBuilder};

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub monitoring_timeout: Duration,
    pub control_timeout: Duration,
    pub config_management: bool,
    pub reboot_grace: Duration,
}

impl BridgeSettings {
    pub fn from_config(config: &ConfigWrapper) -> Self {
        let device = config.device();
        Self {
            monitoring_timeout: device.monitoring_timeout(),
            control_timeout: device.control_timeout(),
            config_management: config.config_management(),
            reboot_grace: config.reboot_grace(),
        }
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            monitoring_timeout: Duration::from_secs(30),
            control_timeout: Duration::from_secs(3),
            config_management: true,
            reboot_grace: Duration::from_secs(120),
        }
    }
}

pub(crate) struct BridgeState<T> {
    pub(crate) transport: T,
    pub(crate) cache: ResponseCache,
    /// Last snapshot handed out; served again on skipped polls.
    pub(crate) snapshot: Option<Snapshot>,
    pub(crate) cycle: PollCycle,
    /// Set by a successful control; the next poll returns `snapshot` untouched.
    pub(crate) priority_delivery: bool,
    pub(crate) reboot_delay: String,
    pub(crate) reboot_until: Option<Instant>,
    /// Command -> last error, for reads answered with an error banner.
    pub(crate) failed_reads: HashMap<String, String>,
}

impl<T> BridgeState<T> {
    fn in_reboot_window(&self) -> bool {
        self.reboot_until.is_some_and(|until| Instant::now() < until)
    }

    fn last_or_empty(&self) -> Snapshot {
        self.snapshot.clone().unwrap_or_default()
    }
}

/// Polling and control engine for one device session.
///
/// Every public operation holds the same lock for its whole duration, so a
/// control never interleaves with a poll.
pub struct Bridge<T: Transport> {
    state: tokio::sync::Mutex<BridgeState<T>>,
    settings: BridgeSettings,
}

impl<T: Transport> Bridge<T> {
    pub fn new(mut transport: T, settings: BridgeSettings) -> Self {
        transport.set_timeout(settings.monitoring_timeout);

        let state = BridgeState {
            transport,
            cache: ResponseCache::new(),
            snapshot: None,
            cycle: PollCycle::new(settings.config_management),
            priority_delivery: false,
            reboot_delay: catalog::DEFAULT_REBOOT_DELAY.to_string(),
            reboot_until: None,
            failed_reads: HashMap::new(),
        };

        Self {
            state: tokio::sync::Mutex::new(state),
            settings,
        }
    }

    /// Runs one poll: issues this call's reads and returns the resulting
    /// snapshot. With configuration management the very first call returns
    /// an empty snapshot.
    pub async fn poll_snapshot(&self) -> Result<Snapshot, BridgeError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.priority_delivery {
            state.priority_delivery = false;
            debug!("serving snapshot patched by the last control");
            return Ok(state.last_or_empty());
        }

        let stage = state.cycle.stage();
        let reads = stage.reads();
        debug!("poll: {:?} stage, {} reads", stage, reads.len());

        let result = ReadDevice::new(&mut state.transport, &mut state.cache, &mut state.failed_reads)
            .run(&reads)
            .await;

        if let Err(err) = result {
            if let BridgeError::Transport(e) = &err {
                if e.is_fatal() {
                    state.transport.disconnect().await;
                }
            }
            if state.in_reboot_window() && !matches!(err, BridgeError::Auth(_)) {
                warn!("device rebooting, serving last snapshot: {}", err);
                return Ok(state.last_or_empty());
            }
            error!("poll failed in {:?} stage: {}", stage, err);
            return Err(err);
        }

        let builder = SnapshotBuilder::new(&state.cache).reboot_delay(&state.reboot_delay);
        let previous = state.snapshot.take().filter(|s| !s.is_empty());

        let snapshot = match (stage, previous) {
            (Stage::Monitoring, _) => builder.build(Section::Monitoring),
            (Stage::Base, None) => Snapshot::new(),
            (Stage::Crosspoint, None) => builder.build(Section::Full),
            (stage, Some(previous)) => {
                let fresh = builder.build(stage.section());
                if stage == Stage::Base {
                    previous.merge(fresh, catalog::is_crosspoint_key)
                } else {
                    previous.merge(fresh, |key| !catalog::is_crosspoint_key(key))
                }
            }
        };

        state.cycle.advance();
        state.snapshot = Some(snapshot.clone());

        if !state.failed_reads.is_empty() {
            warn!("{} reads currently failing", state.failed_reads.len());
        }

        Ok(snapshot)
    }

    /// Writes `value` to the property `key` and patches the last snapshot.
    /// Unknown keys are ignored.
    pub async fn apply_control(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let result = Coordinator::new(state, &self.settings).apply(key, value).await;

        match &result {
            Ok(()) => info!("control {} = {} applied", key, value),
            Err(BridgeError::Transport(e)) if e.is_fatal() => {
                error!("control {} = {} failed: {}", key, value, e);
                state.transport.disconnect().await;
            }
            Err(e) => error!("control {} = {} failed: {}", key, value, e),
        }

        result
    }

    /// Switches between full and monitoring mode. Staging restarts and the
    /// current snapshot is discarded.
    pub async fn set_config_management(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        if state.cycle.set_config_management(enabled) {
            info!("configuration management {}", if enabled { "enabled" } else { "disabled" });
            state.snapshot = None;
            state.priority_delivery = false;
        }
    }

    pub async fn cycle_state(&self) -> CycleState {
        self.state.lock().await.cycle.state()
    }

    pub async fn failed_reads(&self) -> HashMap<String, String> {
        self.state.lock().await.failed_reads.clone()
    }

    pub async fn last_snapshot(&self) -> Option<Snapshot> {
        self.state.lock().await.snapshot.clone()
    }

    /// Closes the session and forgets everything learned from the device.
    pub async fn teardown(&self) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        state.transport.disconnect().await;
        state.cache.clear();
        state.snapshot = None;
        state.cycle.reset();
        state.priority_delivery = false;
        state.reboot_until = None;
        state.failed_reads.clear();

        info!("bridge torn down");
    }
}

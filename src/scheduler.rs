use crate::prelude::*;
use crate::channels::ChannelData;

use tokio::time::MissedTickBehavior;

/// Drives the bridge: polls on every tick and forwards control requests
/// arriving on `to_scheduler`. Snapshots go out on `from_scheduler`.
pub struct Scheduler<T: Transport> {
    config: ConfigWrapper,
    channels: Channels,
    bridge: Arc<Bridge<T>>,
}

impl<T: Transport> Scheduler<T> {
    pub fn new(config: ConfigWrapper, channels: Channels, bridge: Arc<Bridge<T>>) -> Self {
        Self {
            config,
            channels,
            bridge,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut receiver = self.channels.to_scheduler.subscribe();
        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("scheduler polling every {:?}", self.config.poll_interval());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll().await;
                }
                message = receiver.recv() => match message {
                    Ok(ChannelData::Control(key, value)) => {
                        self.control(&key, &value).await;
                    }
                    Ok(ChannelData::ConfigManagement(enabled)) => {
                        self.config.set_config_management(enabled);
                        self.bridge.set_config_management(enabled).await;
                    }
                    Ok(ChannelData::Shutdown) => break,
                    Ok(ChannelData::Snapshot(_)) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("scheduler lagged, {} requests dropped", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Polls once and publishes the result. Failures are logged; the next
    /// tick retries on a fresh session.
    pub async fn poll(&self) -> Option<Arc<Snapshot>> {
        match self.bridge.poll_snapshot().await {
            Ok(snapshot) => Some(self.publish(snapshot)),
            Err(e) => {
                error!("poll failed: {}", e);
                None
            }
        }
    }

    /// Applies one control and publishes the patched snapshot. The bridge
    /// still owes the next tick its skipped poll.
    pub async fn control(&self, key: &str, value: &str) -> Option<Arc<Snapshot>> {
        // the bridge logs failures
        self.bridge.apply_control(key, value).await.ok()?;

        self.bridge
            .last_snapshot()
            .await
            .map(|snapshot| self.publish(snapshot))
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        debug!(
            "publishing snapshot: {} properties, {} controls",
            snapshot.properties.len(),
            snapshot.controls.len()
        );
        if self
            .channels
            .from_scheduler
            .send(ChannelData::Snapshot(snapshot.clone()))
            .is_err()
        {
            trace!("no snapshot subscribers");
        }
        snapshot
    }

    pub async fn stop(&self) {
        info!("scheduler stopping");
        self.bridge.teardown().await;
    }
}

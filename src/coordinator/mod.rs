use crate::prelude::*;

pub mod commands;

use crate::bridge::{BridgeSettings, BridgeState};
use crate::command::{self, ControlTarget};
use crate::transport::TimeoutGuard;
use commands::{master_mute::MasterMute, reboot::Reboot, write::WriteControl};

use std::time::Instant;

/// Carries out one control against the bridge state it was handed.
pub(crate) struct Coordinator<'a, T: Transport> {
    state: &'a mut BridgeState<T>,
    settings: &'a BridgeSettings,
}

impl<'a, T: Transport> Coordinator<'a, T> {
    pub(crate) fn new(state: &'a mut BridgeState<T>, settings: &'a BridgeSettings) -> Self {
        Self { state, settings }
    }

    pub(crate) async fn apply(self, key: &str, value: &str) -> Result<(), BridgeError> {
        let Some(target) = ControlTarget::resolve(key) else {
            warn!("property {} is not controllable, ignoring", key);
            return Ok(());
        };

        let BridgeState {
            transport,
            cache,
            snapshot,
            priority_delivery,
            reboot_delay,
            reboot_until,
            failed_reads,
            ..
        } = self.state;

        let snapshot = match snapshot.as_mut() {
            Some(snapshot) if !snapshot.is_empty() => snapshot,
            _ => return Err(BridgeError::NotReady),
        };

        let invalid = |reason: String| BridgeError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match target {
            ControlTarget::SystemRebootDelay => {
                *reboot_delay = command::parse_reboot_delay(key, value)?;
                snapshot.patch(key, reboot_delay).map_err(invalid)?;
            }
            ControlTarget::SystemReboot => {
                let mut transport = TimeoutGuard::new(transport, self.settings.control_timeout);
                Reboot::new(command::reboot_command(reboot_delay)?)
                    .run(&mut *transport)
                    .await?;
                *reboot_until = Some(Instant::now() + self.settings.reboot_grace);
            }
            ControlTarget::AudioMute => {
                let engaged = crate::snapshot::parse_switch(value).map_err(invalid)?;
                let mut transport = TimeoutGuard::new(transport, self.settings.control_timeout);
                if let Some(write) = target.write_command(key, value)? {
                    WriteControl::new(key, write).run(&mut *transport).await?;
                }
                MasterMute::new(engaged)
                    .run(&mut *transport, cache, failed_reads, snapshot)
                    .await?;
                // only once the outputs agree with the new state
                snapshot.patch(key, value).map_err(invalid)?;
            }
            _ => {
                let mut transport = TimeoutGuard::new(transport, self.settings.control_timeout);
                if let Some(write) = target.write_command(key, value)? {
                    WriteControl::new(key, write).run(&mut *transport).await?;
                }
                snapshot.patch(key, value).map_err(invalid)?;
                if let (Some(current_key), Some(level)) =
                    (target.current_value_key(), crate::parser::parse_level(value))
                {
                    snapshot.set_property(current_key, crate::parser::current_value(level).to_string());
                }
            }
        }

        *priority_delivery = true;
        Ok(())
    }
}

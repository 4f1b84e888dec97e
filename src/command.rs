use crate::prelude::*;
use crate::catalog::{self, AudioInput, AudioOutput, AudioPath, PropertyKey};
use crate::snapshot::{parse_slider, parse_switch};

/// What a control key addresses on the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlTarget {
    VideoMute,
    AudioMute,
    StreamingMode,
    SystemReboot,
    SystemRebootDelay,
    Mute(AudioPath),
    Volume(AudioPath),
    CrosspointGain {
        output: &'static AudioOutput,
        input: &'static AudioInput,
    },
}

impl ControlTarget {
    pub fn resolve(key: &str) -> Option<Self> {
        let key = PropertyKey::from_str(key).ok()?;

        match (key.group(), key.field()) {
            (None, catalog::VIDEO_MUTE) => Some(ControlTarget::VideoMute),
            (None, catalog::AUDIO_MUTE) => Some(ControlTarget::AudioMute),
            (None, catalog::STREAMING_MODE) => Some(ControlTarget::StreamingMode),
            (None, catalog::SYSTEM_REBOOT) => Some(ControlTarget::SystemReboot),
            (None, catalog::SYSTEM_REBOOT_DELAY) => Some(ControlTarget::SystemRebootDelay),
            (Some(group), field) if group.starts_with(catalog::CROSSPOINT_GAIN) => {
                let output = catalog::output_by_group(group.strip_prefix(catalog::CROSSPOINT_GAIN)?)?;
                let input = catalog::input_by_group(field.strip_suffix(catalog::GAIN)?)?;
                Some(ControlTarget::CrosspointGain { output, input })
            }
            (Some(group), catalog::MUTE) => AudioPath::by_group(group).map(ControlTarget::Mute),
            (Some(group), catalog::VOLUME) => AudioPath::by_group(group).map(ControlTarget::Volume),
            _ => None,
        }
    }

    /// Key of the truncated companion value a slider write also updates.
    pub fn current_value_key(&self) -> Option<String> {
        match self {
            ControlTarget::Volume(path) => Some(path.volume_current_key()),
            ControlTarget::CrosspointGain { output, input } => {
                Some(catalog::gain_current_key(output, input))
            }
            _ => None,
        }
    }

    /// Validates `value` and renders the write command for it. Reboot and its
    /// delay are handled by the coordinator and have no plain write command.
    pub fn write_command(&self, key: &str, value: &str) -> Result<Option<String>, BridgeError> {
        let invalid = |reason: String| BridgeError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };
        let on_off = || -> Result<&'static str, BridgeError> {
            Ok(if parse_switch(value).map_err(invalid)? {
                catalog::ON
            } else {
                catalog::OFF
            })
        };
        let level = value.trim();

        let command = match self {
            ControlTarget::VideoMute => catalog::render(catalog::VIDEO_MUTE_SET, &[("value", on_off()?)])?,
            ControlTarget::AudioMute => catalog::render(catalog::AUDIO_MUTE_SET, &[("value", on_off()?)])?,
            ControlTarget::StreamingMode => {
                let mode = if parse_switch(value).map_err(invalid)? {
                    catalog::IP
                } else {
                    catalog::USB
                };
                catalog::render(catalog::STREAMING_MODE_SET, &[("value", mode)])?
            }
            ControlTarget::Mute(path) => catalog::render(
                catalog::PATH_MUTE_SET,
                &[("path", path.token()), ("value", on_off()?)],
            )?,
            ControlTarget::Volume(path) => {
                let (start, end) = path.volume_range();
                parse_slider(level, start, end).map_err(invalid)?;
                catalog::render(
                    catalog::PATH_VOLUME_SET,
                    &[("path", path.token()), ("value", level)],
                )?
            }
            ControlTarget::CrosspointGain { output, input } => {
                parse_slider(level, catalog::MIN_GAIN, catalog::MAX_GAIN).map_err(invalid)?;
                catalog::render(
                    catalog::CROSSPOINT_GAIN_SET,
                    &[("path", output.token), ("input", input.token), ("value", level)],
                )?
            }
            ControlTarget::SystemReboot | ControlTarget::SystemRebootDelay => return Ok(None),
        };

        Ok(Some(command))
    }
}

/// Reboot command honouring a configured delay in seconds.
pub fn reboot_command(delay: &str) -> Result<String, BridgeError> {
    match delay.trim() {
        "" | "0" => catalog::render(catalog::SYSTEM_REBOOT_NOW, &[]),
        delay => catalog::render(catalog::SYSTEM_REBOOT_DELAYED, &[("value", delay)]),
    }
}

/// Accepts a non-negative whole number of seconds.
pub fn parse_reboot_delay(key: &str, value: &str) -> Result<String, BridgeError> {
    value
        .trim()
        .parse::<u32>()
        .map(|secs| secs.to_string())
        .map_err(|_| BridgeError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a whole number of seconds".to_string(),
        })
}

use crate::prelude::*;
use crate::catalog::{self, AudioOutput, AudioPath, StreamField};
use crate::parser::{self, StreamMode};

use super::{Control, ControllableElement, Snapshot};

/// Which part of the snapshot a build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Everything except the crosspoint gains.
    Base,
    /// Only the crosspoint gains.
    Crosspoint,
    /// Base and crosspoint together.
    Full,
    /// Read-only monitoring fields, no controls.
    Monitoring,
}

/// Turns cached responses into a [`Snapshot`].
pub struct SnapshotBuilder<'a> {
    cache: &'a ResponseCache,
    reboot_delay: &'a str,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(cache: &'a ResponseCache) -> Self {
        Self {
            cache,
            reboot_delay: catalog::DEFAULT_REBOOT_DELAY,
        }
    }

    pub fn reboot_delay(mut self, delay: &'a str) -> Self {
        self.reboot_delay = delay;
        self
    }

    pub fn build(&self, section: Section) -> Snapshot {
        let mut snapshot = Snapshot::new();

        match section {
            Section::Base => self.base(&mut snapshot),
            Section::Crosspoint => self.gains(&mut snapshot),
            Section::Full => {
                self.base(&mut snapshot);
                self.gains(&mut snapshot);
            }
            Section::Monitoring => self.monitoring(&mut snapshot),
        }

        debug!(
            "built {:?} snapshot: {} properties, {} controls",
            section,
            snapshot.properties.len(),
            snapshot.controls.len()
        );

        snapshot
    }

    fn monitoring(&self, snapshot: &mut Snapshot) {
        self.network(snapshot);
        self.versions(snapshot);
        self.streaming_settings(snapshot);
        self.routes(snapshot);
    }

    fn base(&self, snapshot: &mut Snapshot) {
        self.monitoring(snapshot);
        self.streaming_mode(snapshot);
        self.switch(snapshot, catalog::VIDEO_MUTE, catalog::VIDEO_MUTE);
        self.switch(snapshot, catalog::AUDIO_MUTE, catalog::AUDIO_MUTE);
        self.reboot(snapshot);

        let master_muted = self.master_muted();
        for path in AudioPath::paths() {
            self.path(snapshot, path, master_muted);
        }
    }

    pub fn master_muted(&self) -> bool {
        self.cache
            .get(catalog::AUDIO_MUTE)
            .and_then(parser::parse_mute)
            .unwrap_or(false)
    }

    fn cached(&self, key: &str) -> Option<&str> {
        self.cache.get(key)
    }

    /// Volume and mute for one path. Outputs show `On` with no control while
    /// the master mute is engaged.
    pub fn path(&self, snapshot: &mut Snapshot, path: AudioPath, master_muted: bool) {
        let key = path.volume_key();
        let current_key = path.volume_current_key();
        match self.cached(&key).and_then(parser::parse_volume) {
            Some(level) => {
                let (start, end) = path.volume_range();
                snapshot.set_property(&key, parser::format_level(level));
                snapshot.set_property(current_key, parser::current_value(level).to_string());
                snapshot.upsert_control(ControllableElement::new(
                    key,
                    Control::slider(start, end, level),
                ));
            }
            None => {
                snapshot.set_property(key, catalog::NONE);
                snapshot.set_property(current_key, catalog::NONE);
            }
        }

        let mute_key = path.mute_key();
        if master_muted && matches!(path, AudioPath::Output(_)) {
            snapshot.set_property(&mute_key, catalog::ON);
            snapshot.remove_control(&mute_key);
            return;
        }
        self.switch(snapshot, &mute_key, &mute_key);
    }

    /// `on`/`off` switch backed by a `mute:` reply.
    fn switch(&self, snapshot: &mut Snapshot, key: &str, cache_key: &str) {
        match self.cached(cache_key).and_then(parser::parse_mute) {
            Some(on) => {
                snapshot.set_property(key, if on { "1" } else { "0" });
                snapshot.upsert_control(ControllableElement::new(
                    key,
                    Control::switch(catalog::OFF, catalog::ON, on),
                ));
            }
            None => snapshot.set_property(key, catalog::NONE),
        }
    }

    fn stream_mode(&self) -> Option<StreamMode> {
        self.cached(catalog::STREAMING_MODE)
            .and_then(parser::parse_stream_mode)
    }

    fn streaming_mode(&self, snapshot: &mut Snapshot) {
        match self.stream_mode() {
            Some(mode) => {
                let on = mode == StreamMode::Ip;
                snapshot.set_property(catalog::STREAMING_MODE, if on { "1" } else { "0" });
                snapshot.upsert_control(ControllableElement::new(
                    catalog::STREAMING_MODE,
                    Control::switch(catalog::USB, catalog::IP, on),
                ));
            }
            None => snapshot.set_property(catalog::STREAMING_MODE, catalog::NONE),
        }
    }

    fn reboot(&self, snapshot: &mut Snapshot) {
        snapshot.set_property(catalog::SYSTEM_REBOOT, "");
        snapshot.upsert_control(ControllableElement::new(
            catalog::SYSTEM_REBOOT,
            Control::Button {
                label: catalog::REBOOT.to_string(),
                label_pressed: catalog::REBOOTING.to_string(),
                grace_period: 0,
            },
        ));

        snapshot.set_property(catalog::SYSTEM_REBOOT_DELAY, self.reboot_delay);
        snapshot.upsert_control(ControllableElement::new(
            catalog::SYSTEM_REBOOT_DELAY,
            Control::Numeric {
                value: self.reboot_delay.to_string(),
            },
        ));
    }

    fn network(&self, snapshot: &mut Snapshot) {
        let raw = self.cached(catalog::NETWORK_SETTINGS).unwrap_or_default();
        for (field, value) in parser::parse_network(raw) {
            snapshot.set_property(
                format!("{}#{}", catalog::NETWORK_SETTINGS, field),
                value.unwrap_or_else(|| catalog::NONE.to_string()),
            );
        }
    }

    fn versions(&self, snapshot: &mut Snapshot) {
        let raw = self.cached(catalog::SYSTEM_VERSION).unwrap_or_default();
        let system = parser::extract(raw, &parser::SYSTEM_VERSION);
        let audio = parser::extract(raw, &parser::AUDIO_VERSION);
        snapshot.set_property(
            catalog::SYSTEM_VERSION,
            system.unwrap_or_else(|| catalog::NONE.to_string()),
        );
        snapshot.set_property(
            catalog::AUDIO_VERSION,
            audio.unwrap_or_else(|| catalog::NONE.to_string()),
        );
    }

    /// Fields of the active streaming mode only. In IP mode the video quality
    /// picks custom or preset fields and the protocol picks RTMP or RTSP ones.
    fn streaming_settings(&self, snapshot: &mut Snapshot) {
        let Some(mode) = self.stream_mode() else {
            return;
        };
        let raw = self.cached(catalog::STREAMING_SETTINGS).unwrap_or_default();

        let quality = parser::parse_stream_field(raw, catalog::IP_VIDEO_QUALITY);
        let custom = quality
            .as_deref()
            .is_some_and(|q| q.eq_ignore_ascii_case(catalog::CUSTOM));
        let protocol = parser::parse_stream_field(raw, catalog::IP_PROTOCOL).map(|p| {
            if p.eq_ignore_ascii_case("false") || p.eq_ignore_ascii_case(catalog::RTSP) {
                catalog::RTSP
            } else {
                catalog::RTMP
            }
        });

        let hidden = |field: &StreamField| -> bool {
            if field.ip != (mode == StreamMode::Ip) {
                return true;
            }
            let name = field.name;
            if custom && catalog::PRESET_QUALITY_FIELDS.contains(&name) {
                return true;
            }
            if !custom && catalog::CUSTOM_QUALITY_FIELDS.contains(&name) {
                return true;
            }
            match protocol {
                Some(catalog::RTSP) => catalog::RTMP_FIELDS.contains(&name),
                Some(_) => catalog::RTSP_FIELDS.contains(&name),
                None => catalog::RTMP_FIELDS.contains(&name) || catalog::RTSP_FIELDS.contains(&name),
            }
        };

        for field in catalog::STREAM_FIELDS.iter().filter(|f| !hidden(*f)) {
            let value = match field.name {
                catalog::IP_PROTOCOL => protocol.map(str::to_string),
                catalog::IP_STREAMING_ENABLED | catalog::HID_AUDIO_CONTROLS_ENABLED => {
                    parser::parse_stream_field(raw, field.name).map(|v| {
                        if v.eq_ignore_ascii_case("true") {
                            catalog::ENABLED.to_string()
                        } else {
                            catalog::DISABLED.to_string()
                        }
                    })
                }
                _ => parser::parse_stream_field(raw, field.name),
            };
            snapshot.set_property(
                format!("{}#{}", catalog::STREAMING_SETTINGS, field.name),
                value.unwrap_or_else(|| catalog::NONE.to_string()),
            );
        }
    }

    fn routes(&self, snapshot: &mut Snapshot) {
        for output in catalog::OUTPUTS.iter() {
            let key = catalog::routes_key(output);
            let routes = self.cached(&key).and_then(parser::parse_routes);
            snapshot.set_property(key, routes.unwrap_or_else(|| catalog::NONE.to_string()));
        }
    }

    fn gains(&self, snapshot: &mut Snapshot) {
        for output in catalog::OUTPUTS.iter() {
            self.output_gains(snapshot, output);
        }
    }

    fn output_gains(&self, snapshot: &mut Snapshot, output: &AudioOutput) {
        for input in catalog::INPUTS.iter() {
            let key = catalog::gain_key(output, input);
            let current_key = catalog::gain_current_key(output, input);
            match self.cached(&key).and_then(parser::parse_gain) {
                Some(level) => {
                    snapshot.set_property(&key, parser::format_level(level));
                    snapshot.set_property(current_key, parser::current_value(level).to_string());
                    snapshot.upsert_control(ControllableElement::new(
                        key,
                        Control::slider(catalog::MIN_GAIN, catalog::MAX_GAIN, level),
                    ));
                }
                None => {
                    snapshot.set_property(key, catalog::NONE);
                    snapshot.set_property(current_key, catalog::NONE);
                }
            }
        }
    }
}

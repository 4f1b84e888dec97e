use crate::prelude::*;

use strfmt::strfmt;

// Names {{{
pub const NONE: &str = "None";
pub const ON: &str = "On";
pub const OFF: &str = "Off";
pub const USB: &str = "USB";
pub const IP: &str = "IP";
pub const ENABLED: &str = "Enabled";
pub const DISABLED: &str = "Disabled";
pub const CUSTOM: &str = "Custom";
pub const RTMP: &str = "RTMP";
pub const RTSP: &str = "RTSP";

pub const STREAMING_MODE: &str = "StreamingMode";
pub const NETWORK_SETTINGS: &str = "NetworkSettings";
pub const SYSTEM_VERSION: &str = "SystemVersion";
pub const AUDIO_VERSION: &str = "AudioVersion";
pub const VIDEO_MUTE: &str = "VideoMute";
pub const STREAMING_SETTINGS: &str = "StreamingSettings";
pub const AUDIO_MUTE: &str = "AudioMute";
pub const SYSTEM_REBOOT: &str = "SystemReboot";
pub const SYSTEM_REBOOT_DELAY: &str = "SystemRebootDelay(s)";

pub const CROSSPOINT_GAIN: &str = "CrosspointGain";
pub const MUTE: &str = "Mute";
pub const VOLUME: &str = "Volume(dB)";
pub const VOLUME_CURRENT_VALUE: &str = "VolumeCurrentValue(dB)";
pub const GAIN: &str = "Gain(dB)";
pub const GAIN_CURRENT_VALUE: &str = "GainCurrentValue(dB)";
pub const ENABLED_ROUTES: &str = "EnabledRoutes";

pub const REBOOT: &str = "Reboot";
pub const REBOOTING: &str = "Rebooting";
pub const DEFAULT_REBOOT_DELAY: &str = "0";

/// Marks a successful write in the device reply.
pub const WRITE_OK: &str = "OK";
/// Marks a command the device could not parse.
pub const SYNTAX_ERROR: &str = "Syntax error";

pub const USB_STREAM_MODE: &str = "USB streaming mode";
pub const IP_STREAM_MODE: &str = "IP streaming mode";
// }}}

// Bounds {{{
pub const MIN_VOLUME_LINE: f32 = -48.0;
pub const MIN_VOLUME: f32 = -42.0;
pub const MAX_VOLUME: f32 = 6.0;
pub const MIN_GAIN: f32 = -12.0;
pub const MAX_GAIN: f32 = 12.0;
// }}}

// Write templates {{{
pub const VIDEO_MUTE_SET: &str = "video mute {value}";
pub const AUDIO_MUTE_SET: &str = "audio mute {value}";
pub const STREAMING_MODE_SET: &str = "streaming mode set {value}";
pub const SYSTEM_REBOOT_NOW: &str = "system reboot";
pub const SYSTEM_REBOOT_DELAYED: &str = "system reboot {value}";
pub const PATH_MUTE_SET: &str = "audio {path} mute {value}";
pub const PATH_VOLUME_SET: &str = "audio {path} volume set {value}";
pub const CROSSPOINT_GAIN_SET: &str = "audio {path} crosspoint-gain {input} set {value}";

/// Fills a write template and lower-cases the result the way the device expects.
pub fn render(template: &str, params: &[(&str, &str)]) -> Result<String, BridgeError> {
    let vars: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    strfmt(template, &vars)
        .map(|command| command.to_lowercase())
        .map_err(|e| BridgeError::Template {
            template: template.to_string(),
            reason: e.to_string(),
        })
}
// }}}

// Audio paths {{{
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInput {
    pub display: &'static str,
    pub token: &'static str,
    pub group: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioOutput {
    pub group: &'static str,
    pub token: &'static str,
}

pub static INPUTS: [AudioInput; 6] = [
    AudioInput { display: "Line In Left", token: "line_in_left", group: "LineInLeft" },
    AudioInput { display: "Line In Right", token: "line_in_right", group: "LineInRight" },
    AudioInput { display: "USB Playback Left", token: "usb_playback_left", group: "USBPlaybackLeft" },
    AudioInput { display: "USB Playback Right", token: "usb_playback_right", group: "USBPlaybackRight" },
    AudioInput { display: "HDMI In Left", token: "hdmi_in_left", group: "HDMIInLeft" },
    AudioInput { display: "HDMI In Right", token: "hdmi_in_right", group: "HDMIInRight" },
];

pub static OUTPUTS: [AudioOutput; 8] = [
    AudioOutput { group: "LineOutLeft", token: "line_out_left" },
    AudioOutput { group: "LineOutRight", token: "line_out_right" },
    AudioOutput { group: "USBRecordLeft", token: "usb_record_left" },
    AudioOutput { group: "USBRecordRight", token: "usb_record_right" },
    AudioOutput { group: "IPStreamLeft", token: "ip_out_left" },
    AudioOutput { group: "IPStreamRight", token: "ip_out_right" },
    AudioOutput { group: "HDMIOutLeft", token: "hdmi_out_left" },
    AudioOutput { group: "HDMIOutRight", token: "hdmi_out_right" },
];

pub fn input_by_group(group: &str) -> Option<&'static AudioInput> {
    INPUTS.iter().find(|i| i.group == group)
}

pub fn input_by_token(token: &str) -> Option<&'static AudioInput> {
    INPUTS.iter().find(|i| i.token == token)
}

pub fn output_by_group(group: &str) -> Option<&'static AudioOutput> {
    OUTPUTS.iter().find(|o| o.group == group)
}

/// A volume/mute-bearing path, either side of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioPath {
    Input(&'static AudioInput),
    Output(&'static AudioOutput),
}

impl AudioPath {
    pub fn by_group(group: &str) -> Option<Self> {
        input_by_group(group)
            .map(AudioPath::Input)
            .or_else(|| output_by_group(group).map(AudioPath::Output))
    }

    pub fn group(&self) -> &'static str {
        match self {
            AudioPath::Input(i) => i.group,
            AudioPath::Output(o) => o.group,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            AudioPath::Input(i) => i.token,
            AudioPath::Output(o) => o.token,
        }
    }

    pub fn is_line(&self) -> bool {
        self.group().starts_with("Line")
    }

    pub fn volume_range(&self) -> (f32, f32) {
        if self.is_line() {
            (MIN_VOLUME_LINE, MAX_VOLUME)
        } else {
            (MIN_VOLUME, MAX_VOLUME)
        }
    }

    pub fn volume_key(&self) -> String {
        format!("{}#{}", self.group(), VOLUME)
    }

    pub fn volume_current_key(&self) -> String {
        format!("{}#{}", self.group(), VOLUME_CURRENT_VALUE)
    }

    pub fn mute_key(&self) -> String {
        format!("{}#{}", self.group(), MUTE)
    }

    pub fn volume_read(&self) -> ReadCommand {
        ReadCommand::new(
            self.volume_key(),
            format!("audio {} volume get", self.token()),
            Tier::Core,
        )
    }

    pub fn mute_read(&self) -> ReadCommand {
        ReadCommand::new(
            self.mute_key(),
            format!("audio {} mute get", self.token()),
            Tier::Core,
        )
    }

    pub fn paths() -> impl Iterator<Item = AudioPath> {
        INPUTS
            .iter()
            .map(AudioPath::Input)
            .chain(OUTPUTS.iter().map(AudioPath::Output))
    }
}

pub fn routes_key(output: &AudioOutput) -> String {
    format!("{}{}#{}", CROSSPOINT_GAIN, output.group, ENABLED_ROUTES)
}

pub fn gain_key(output: &AudioOutput, input: &AudioInput) -> String {
    format!("{}{}#{}{}", CROSSPOINT_GAIN, output.group, input.group, GAIN)
}

pub fn gain_current_key(output: &AudioOutput, input: &AudioInput) -> String {
    format!("{}{}#{}{}", CROSSPOINT_GAIN, output.group, input.group, GAIN_CURRENT_VALUE)
}

/// True for keys refreshed by the crosspoint-gain stage.
pub fn is_crosspoint_key(key: &str) -> bool {
    match key.split_once('#') {
        Some((group, field)) => {
            group.starts_with(CROSSPOINT_GAIN)
                && (field.ends_with(GAIN) || field.ends_with(GAIN_CURRENT_VALUE))
        }
        None => false,
    }
}
// }}}

// PropertyKey {{{
/// A rendered property name, `group#field` or a bare `field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyKey {
    group: Option<String>,
    field: String,
}

impl PropertyKey {
    pub fn new(group: Option<&str>, field: &str) -> Self {
        Self {
            group: group.map(str::to_string),
            field: field.to_string(),
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}#{}", group, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

impl FromStr for PropertyKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            bail!("empty property key");
        }
        Ok(match s.split_once('#') {
            Some((group, field)) => Self::new(Some(group), field),
            None => Self::new(None, s),
        })
    }
} // }}}

// Read commands {{{
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Monitoring reads issued on every base refresh, in every mode.
    Lite,
    /// Control-backing reads, only with configuration management.
    Core,
    /// The input x output gain matrix.
    Crosspoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadCommand {
    /// Cache key the cleaned response is stored under.
    pub key: String,
    pub command: String,
    pub tier: Tier,
}

impl ReadCommand {
    pub fn new(key: impl Into<String>, command: impl Into<String>, tier: Tier) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
            tier,
        }
    }
}

const TOP_LEVEL: [(&str, &str, Tier); 6] = [
    (STREAMING_MODE, "streaming mode get", Tier::Lite),
    (NETWORK_SETTINGS, "network settings get", Tier::Lite),
    (SYSTEM_VERSION, "version", Tier::Lite),
    (VIDEO_MUTE, "video mute get", Tier::Core),
    (STREAMING_SETTINGS, "streaming settings get", Tier::Lite),
    (AUDIO_MUTE, "audio mute get", Tier::Core),
];

/// Expands every read of the given tier, in issue order.
pub fn reads(tier: Tier) -> Vec<ReadCommand> {
    match tier {
        Tier::Lite => {
            let mut reads: Vec<ReadCommand> = TOP_LEVEL
                .iter()
                .filter(|(_, _, t)| *t == Tier::Lite)
                .map(|(key, command, t)| ReadCommand::new(*key, *command, *t))
                .collect();
            reads.extend(OUTPUTS.iter().map(|o| {
                ReadCommand::new(routes_key(o), format!("audio {} route get", o.token), Tier::Lite)
            }));
            reads
        }
        Tier::Core => {
            let mut reads: Vec<ReadCommand> = TOP_LEVEL
                .iter()
                .filter(|(_, _, t)| *t == Tier::Core)
                .map(|(key, command, t)| ReadCommand::new(*key, *command, *t))
                .collect();
            for path in AudioPath::paths() {
                reads.push(path.volume_read());
                reads.push(path.mute_read());
            }
            reads
        }
        Tier::Crosspoint => OUTPUTS
            .iter()
            .flat_map(|o| {
                INPUTS.iter().map(move |i| {
                    ReadCommand::new(
                        gain_key(o, i),
                        format!("audio {} crosspoint-gain {} get", o.token, i.token),
                        Tier::Crosspoint,
                    )
                })
            })
            .collect(),
    }
}
// }}}

// Response fields {{{
/// `(property field, response label)` pairs for `network settings get`.
pub const NETWORK_FIELDS: [(&str, &str); 7] = [
    ("InterfaceName", "Name"),
    ("MACAddress", "MAC Address"),
    ("IPAddress", "IP Address"),
    ("SubnetMask", "Netmask"),
    ("VLAN", "VLAN"),
    ("Gateway", "Gateway"),
    ("HostName", "Hostname"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamField {
    pub name: &'static str,
    pub label: &'static str,
    /// Shown in IP mode when true, in USB mode otherwise.
    pub ip: bool,
}

pub const IP_PRESET_RESOLUTION: &str = "IPPresetResolution";
pub const IP_BITRATE_MODE: &str = "IPBitrateMode";
pub const IP_MAX_BANDWIDTH: &str = "IPMaxBandwidth(bps)";
pub const IP_RTMP_PORT: &str = "IPRTMPPort";
pub const IP_RTMP_SERVICE: &str = "IPRTMPService";
pub const IP_RTSP_MTU: &str = "IPRTSPMTU(bytes)";
pub const IP_RTSP_PORT: &str = "IPRTSPPort";
pub const IP_RTSP_URL: &str = "IPRTSPURL";
pub const IP_STREAMING_ENABLED: &str = "IPStreamingEnabled";
pub const HID_AUDIO_CONTROLS_ENABLED: &str = "HIDAudioControlsEnabled";
pub const USB_DEVICE: &str = "USBDevice";
pub const IP_CUSTOM_RESOLUTION: &str = "IPCustomResolution";
pub const IP_VIDEO_QUALITY: &str = "IPVideoQuality";
pub const IP_PROTOCOL: &str = "IPProtocol";

pub const STREAM_FIELDS: [StreamField; 14] = [
    StreamField { name: IP_PRESET_RESOLUTION, label: "IP Preset_Resolution", ip: true },
    StreamField { name: IP_BITRATE_MODE, label: "IP Bit_Rate_Mode", ip: true },
    StreamField { name: IP_MAX_BANDWIDTH, label: "IP Max_Bandwidth", ip: true },
    StreamField { name: IP_RTMP_PORT, label: "IP RTMP_Port", ip: true },
    StreamField { name: IP_RTMP_SERVICE, label: "IP RTMP_SERVICE", ip: true },
    StreamField { name: IP_RTSP_MTU, label: "IP RTSP_MTU", ip: true },
    StreamField { name: IP_RTSP_PORT, label: "IP RTSP_Port", ip: true },
    StreamField { name: IP_RTSP_URL, label: "IP RTSP_URL", ip: true },
    StreamField { name: IP_STREAMING_ENABLED, label: "IP Streaming_Enabled", ip: true },
    StreamField { name: HID_AUDIO_CONTROLS_ENABLED, label: "HID Audio_Controls_Enabled", ip: false },
    StreamField { name: USB_DEVICE, label: "USB Device", ip: false },
    StreamField { name: IP_CUSTOM_RESOLUTION, label: "IP Custom_Resolution", ip: true },
    StreamField { name: IP_VIDEO_QUALITY, label: "IP Video_Quality", ip: true },
    StreamField { name: IP_PROTOCOL, label: "IP Protocol", ip: true },
];

pub const CUSTOM_QUALITY_FIELDS: [&str; 3] = [IP_MAX_BANDWIDTH, IP_CUSTOM_RESOLUTION, IP_BITRATE_MODE];
pub const PRESET_QUALITY_FIELDS: [&str; 1] = [IP_PRESET_RESOLUTION];
pub const RTMP_FIELDS: [&str; 2] = [IP_RTMP_PORT, IP_RTMP_SERVICE];
pub const RTSP_FIELDS: [&str; 3] = [IP_RTSP_PORT, IP_RTSP_URL, IP_RTSP_MTU];
// }}}

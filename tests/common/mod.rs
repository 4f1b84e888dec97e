#![allow(dead_code)]

pub use nano_bridge::bridge::BridgeSettings;
pub use nano_bridge::catalog::{self, AudioPath, INPUTS, OUTPUTS};
pub use nano_bridge::cycle::CycleState;
pub use nano_bridge::prelude::*;

use async_trait::async_trait;
use std::sync::Mutex;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// How the scripted device misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Timeout,
    Disconnect,
    Auth,
    Banner,
}

#[derive(Default)]
struct DeviceState {
    responses: HashMap<String, String>,
    faults: HashMap<String, Fault>,
    fault_all: Option<Fault>,
    sent: Vec<(String, Duration)>,
    connects: usize,
}

/// Shared script and record of one fake device. Clones see the same state,
/// so a test keeps one handle while the bridge owns the transport.
#[derive(Clone, Default)]
pub struct FakeDevice(Arc<Mutex<DeviceState>>);

impl FakeDevice {
    fn state(&self) -> std::sync::MutexGuard<'_, DeviceState> {
        self.0.lock().unwrap()
    }

    /// `response` is what the device prints after echoing `command`.
    pub fn respond(&self, command: &str, response: &str) {
        self.state()
            .responses
            .insert(command.to_string(), format!("{}\r\n{}", command, response));
    }

    pub fn fail(&self, command: &str, fault: Fault) {
        self.state().faults.insert(command.to_string(), fault);
    }

    pub fn fail_all(&self, fault: Option<Fault>) {
        self.state().fault_all = fault;
    }

    pub fn clear_faults(&self) {
        let mut state = self.state();
        state.faults.clear();
        state.fault_all = None;
    }

    pub fn sent(&self) -> Vec<String> {
        self.state().sent.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn sent_with_timeouts(&self) -> Vec<(String, Duration)> {
        self.state().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state().sent.clear();
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn transport(&self) -> ScriptedTransport {
        ScriptedTransport {
            device: self.clone(),
            connected: false,
            timeout: Duration::from_secs(1),
        }
    }
}

pub struct ScriptedTransport {
    device: FakeDevice,
    connected: bool,
    timeout: Duration,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.device.state();
        state.connects += 1;
        match state.fault_all {
            Some(Fault::Auth) => Err(TransportError::Auth(
                "Permission denied, please try again.".to_string(),
            )),
            Some(Fault::Disconnect) => Err(TransportError::Disconnected),
            Some(Fault::Timeout) => Err(TransportError::Timeout(self.timeout)),
            _ => {
                self.connected = true;
                Ok(())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send(&mut self, command: &str) -> Result<String, TransportError> {
        let mut state = self.device.state();
        state.sent.push((command.to_string(), self.timeout));

        let fault = state.faults.get(command).copied().or(state.fault_all);
        match fault {
            Some(Fault::Timeout) => {
                self.connected = false;
                return Err(TransportError::Timeout(self.timeout));
            }
            Some(Fault::Disconnect) => {
                self.connected = false;
                return Err(TransportError::Disconnected);
            }
            Some(Fault::Auth) => {
                return Err(TransportError::Auth(
                    "Permission denied, please try again.".to_string(),
                ))
            }
            Some(Fault::Banner) => {
                return Err(TransportError::ErrorBanner(format!(
                    "{}\r\nError: response error\r\n",
                    command
                )))
            }
            None => {}
        }

        Ok(match state.responses.get(command) {
            Some(response) => response.clone(),
            // unscripted writes are acknowledged, unscripted reads come back blank
            None if command.ends_with(" get") || command == "version" => format!("{}\r\n", command),
            None => format!("{}\r\nOK\r\n", command),
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    async fn disconnect(&mut self) {
        self.connected = false;
    }
}

pub struct Factory;

impl Factory {
    pub fn settings() -> BridgeSettings {
        BridgeSettings {
            monitoring_timeout: Duration::from_secs(30),
            control_timeout: Duration::from_secs(3),
            config_management: true,
            reboot_grace: Duration::from_secs(120),
        }
    }

    pub fn lite_settings() -> BridgeSettings {
        BridgeSettings {
            config_management: false,
            ..Self::settings()
        }
    }

    pub fn bridge(device: &FakeDevice, settings: BridgeSettings) -> Bridge<ScriptedTransport> {
        Bridge::new(device.transport(), settings)
    }

    /// A full-mode bridge that has already produced its first populated snapshot.
    pub async fn primed_bridge(device: &FakeDevice) -> Result<Bridge<ScriptedTransport>> {
        let bridge = Self::bridge(device, Self::settings());
        bridge.poll_snapshot().await?;
        let snapshot = bridge.poll_snapshot().await?;
        assert!(!snapshot.is_empty());
        device.clear_sent();
        Ok(bridge)
    }

    /// A device in IP streaming mode with custom quality over RTSP, every
    /// volume at -1, mutes off, gains at 0 and two routes per output.
    pub fn device() -> FakeDevice {
        let device = FakeDevice::default();

        device.respond("streaming mode get", "\x1B[0;37mIP streaming mode\x1B[0m\r\n");
        device.respond("network settings get", Self::NETWORK);
        device.respond("version", "System Version        Nano 1.2.3\r\nAudio                 2.0.1\r\n");
        device.respond("streaming settings get", &Self::streaming_settings("Custom", "false"));
        device.respond("video mute get", "mute: off\r\n");
        device.respond("audio mute get", "mute: off\r\n");

        for path in AudioPath::paths() {
            device.respond(&format!("audio {} volume get", path.token()), "volume: -1\r\n");
            device.respond(&format!("audio {} mute get", path.token()), "\x1B[0;37mmute: off\x1B[0m\r\n");
        }
        for output in OUTPUTS.iter() {
            device.respond(
                &format!("audio {} route get", output.token),
                "[line_in_left hdmi_in_left]\r\n",
            );
            for input in INPUTS.iter() {
                device.respond(
                    &format!("audio {} crosspoint-gain {} get", output.token, input.token),
                    "0.0\r\n",
                );
            }
        }

        device
    }

    pub const NETWORK: &'static str = "Name          eth0:WAN\r\nMAC Address   00:04:a5:aa:bb:cc\r\nIP Address    10.0.0.5\r\nNetmask       255.255.255.0\r\nVLAN          Disabled\r\nGateway       10.0.0.1\r\nHostname      nano\r\n";

    pub fn streaming_settings(quality: &str, protocol: &str) -> String {
        [
            "IP Preset_Resolution   720p\r\n".to_string(),
            "IP Bit_Rate_Mode       constant\r\n".to_string(),
            "IP Max_Bandwidth       4000000\r\n".to_string(),
            "IP RTMP_Port           1935\r\n".to_string(),
            "IP RTMP_SERVICE        youtube\r\n".to_string(),
            "IP RTSP_MTU            1400\r\n".to_string(),
            "IP RTSP_Port           554\r\n".to_string(),
            "IP RTSP_URL            vaddio-nano-stream\r\n".to_string(),
            "IP Streaming_Enabled   true\r\n".to_string(),
            "HID Audio_Controls_Enabled false\r\n".to_string(),
            "USB Device             Nano USB\r\n".to_string(),
            "IP Custom_Resolution   1920x1080\r\n".to_string(),
            format!("IP Video_Quality       {}\r\n", quality),
            format!("IP Protocol            {}\r\n", protocol),
        ]
        .concat()
    }

    /// Number of reads in a full-mode base refresh.
    pub fn base_reads() -> usize {
        catalog::reads(catalog::Tier::Lite).len() + catalog::reads(catalog::Tier::Core).len()
    }
}

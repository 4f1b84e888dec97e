use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use serde_yaml;
use std::sync::Mutex;

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub device: Device,

    /// Full mode (controls, staged crosspoint refresh) when true, monitoring
    /// only otherwise.
    #[serde(default = "Config::default_config_management")]
    pub config_management: bool,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "poll_interval_secs", default = "Config::default_poll_interval")]
    pub poll_interval: Duration,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "reboot_grace_secs", default = "Config::default_reboot_grace")]
    pub reboot_grace: Duration,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// Optional path to append every snapshot to, one JSON object per line
    pub snapshot_file: Option<String>,
}

// Device {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    pub host: String,
    #[serde(default = "Config::default_port")]
    pub port: u16,

    pub monitoring_timeout_ms: Option<u64>,
    pub control_timeout_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub prompt: Option<String>,
    #[serde(default = "Config::default_error_banners")]
    pub error_banners: Vec<String>,
    #[serde(default = "Config::default_login_error_banners")]
    pub login_error_banners: Vec<String>,
    pub tcp_keepalive_secs: Option<u64>,
    pub use_tcp_nodelay: Option<bool>,
}
impl Device {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn monitoring_timeout(&self) -> Duration {
        Duration::from_millis(self.monitoring_timeout_ms.unwrap_or(30000))
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms.unwrap_or(3000))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.unwrap_or(10000))
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("> ")
    }

    pub fn error_banners(&self) -> &[String] {
        &self.error_banners
    }

    pub fn login_error_banners(&self) -> &[String] {
        &self.login_error_banners
    }

    pub fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_secs.unwrap_or(60))
    }

    pub fn use_tcp_nodelay(&self) -> bool {
        self.use_tcp_nodelay.unwrap_or(true)
    }
} // }}}

pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        let config = Config::new(file)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Config> {
        // a poisoned config is still a valid config
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn device(&self) -> Device {
        self.lock().device.clone()
    }

    pub fn config_management(&self) -> bool {
        self.lock().config_management
    }

    pub fn set_config_management(&self, enabled: bool) {
        self.lock().config_management = enabled;
    }

    pub fn poll_interval(&self) -> Duration {
        self.lock().poll_interval
    }

    pub fn reboot_grace(&self) -> Duration {
        self.lock().reboot_grace
    }

    pub fn loglevel(&self) -> String {
        self.lock().loglevel.clone()
    }

    pub fn snapshot_file(&self) -> Option<String> {
        self.lock().snapshot_file.clone()
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;

        info!("Configuration loaded successfully:");
        info!("  Device: {}:{}", config.device.host, config.device.port);
        info!("    Monitoring Timeout: {:?}", config.device.monitoring_timeout());
        info!("    Control Timeout: {:?}", config.device.control_timeout());
        info!("    Connect Timeout: {:?}", config.device.connect_timeout());
        info!("    Prompt: {:?}", config.device.prompt());
        info!("    TCP NoDelay: {}", config.device.use_tcp_nodelay());
        info!(
            "  Mode: {}",
            if config.config_management { "full" } else { "monitoring" }
        );
        info!("  Poll Interval: {:?}", config.poll_interval);
        info!("  Reboot Grace: {:?}", config.reboot_grace);
        if let Some(file) = &config.snapshot_file {
            info!("  Snapshot File: {}", file);
        }
        info!("  Log Level: {}", config.loglevel);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.device.host.is_empty() {
            return Err(anyhow!("config.rs:device host cannot be empty"));
        }
        if self.device.port == 0 {
            bail!("device.port must be between 1 and 65535");
        }
        if self.device.prompt().is_empty() {
            return Err(anyhow!("config.rs:device prompt cannot be empty"));
        }
        if self.device.monitoring_timeout().is_zero() {
            return Err(anyhow!("config.rs:Invalid monitoring timeout: 0"));
        }
        if self.device.control_timeout().is_zero() {
            return Err(anyhow!("config.rs:Invalid control timeout: 0"));
        }
        if self.poll_interval.is_zero() {
            return Err(anyhow!("config.rs:Invalid poll interval: 0"));
        }

        Ok(())
    }

    fn default_port() -> u16 {
        23
    }

    fn default_config_management() -> bool {
        false
    }

    fn default_poll_interval() -> Duration {
        Duration::from_secs(30)
    }

    fn default_reboot_grace() -> Duration {
        Duration::from_secs(120)
    }

    fn default_error_banners() -> Vec<String> {
        vec!["Error: response error".to_string()]
    }

    fn default_login_error_banners() -> Vec<String> {
        vec!["Permission denied, please try again.".to_string()]
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }
}

use crate::prelude::*;
use crate::channels::ChannelData;

use tokio::io::{AsyncBufReadExt, BufReader};

pub const CONFIG_MANAGEMENT: &str = "config_management";

/// Reads `<key>=<value>` lines from stdin and hands them to the scheduler.
///
/// `config_management=<bool>` flips the bridge mode; any other key is a
/// property write.
pub struct ControlInput {
    channels: Channels,
}

impl ControlInput {
    pub fn new(channels: Channels) -> Self {
        Self { channels }
    }

    pub async fn start(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Self::parse(line) {
                Ok(data) => {
                    debug!("RX: {:?}", data);
                    if self.channels.to_scheduler.send(data).is_err() {
                        bail!("send(to_scheduler) failed - channel closed?");
                    }
                }
                Err(e) => warn!("ignoring {:?}: {}", line, e),
            }
        }

        info!("control input closed");
        Ok(())
    }

    pub fn parse(line: &str) -> Result<ChannelData> {
        let Some((key, value)) = line.split_once('=') else {
            bail!("expected <key>=<value>");
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() {
            bail!("empty key");
        }

        if key == CONFIG_MANAGEMENT {
            return Ok(ChannelData::ConfigManagement(payload_bool(value)));
        }

        Ok(ChannelData::Control(key.to_string(), value.to_string()))
    }
}

fn payload_bool(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "on" | "y" | "yes"
    )
}

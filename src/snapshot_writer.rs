use crate::prelude::*;
use crate::channels::ChannelData;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

/// Appends every published snapshot to a file, one JSON object per line.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    file: Arc<Mutex<std::fs::File>>,
    path: String,
    snapshots_written: Arc<Mutex<u64>>,
}

impl SnapshotWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Opening snapshot file at {}", path);

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open snapshot file {}: {}", path, e);
                return Err(e.into());
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
                error!("Failed to set permissions on snapshot file {}: {}", path, e);
                return Err(e.into());
            }
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_string(),
            snapshots_written: Arc::new(Mutex::new(0)),
        })
    }

    pub async fn start(&self, channels: Channels) -> Result<()> {
        let mut receiver = channels.from_scheduler.subscribe();

        loop {
            match receiver.recv().await {
                Ok(ChannelData::Snapshot(snapshot)) => {
                    if let Err(e) = self.write_snapshot(&snapshot) {
                        error!("Failed to record snapshot: {}", e);
                    }
                }
                Ok(ChannelData::Shutdown) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("snapshot writer lagged, {} snapshots lost", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }

    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let line = serde_json::to_string(&serde_json::json!({
            "utc_timestamp": chrono::Utc::now().timestamp(),
            "properties": snapshot.properties,
            "controls": snapshot.controls,
        }))?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot file"))?;
        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            error!("Failed to write to snapshot file {}: {}", self.path, e);
            return Err(e.into());
        }

        let mut written = self
            .snapshots_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot counter"))?;
        *written += 1;
        debug!("{} snapshots written to {}", *written, self.path);

        Ok(())
    }
}

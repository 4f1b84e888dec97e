use crate::prelude::*;
use crate::catalog::{AudioPath, OUTPUTS};
use crate::coordinator::commands::read::ReadDevice;
use crate::snapshot::SnapshotBuilder;

/// Applies a master mute change to the output paths of a snapshot.
///
/// Engaging forces every output mute to `On` and withdraws its control.
/// Releasing re-reads each output's volume and mute and rebuilds both from
/// the fresh replies.
pub struct MasterMute {
    engaged: bool,
}

impl MasterMute {
    pub fn new(engaged: bool) -> Self {
        Self { engaged }
    }

    pub async fn run<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        cache: &mut ResponseCache,
        failed_reads: &mut HashMap<String, String>,
        snapshot: &mut Snapshot,
    ) -> Result<(), BridgeError> {
        let outputs: Vec<AudioPath> = OUTPUTS.iter().map(AudioPath::Output).collect();

        if self.engaged {
            for path in &outputs {
                let key = path.mute_key();
                snapshot.set_property(&key, catalog::ON);
                snapshot.remove_control(&key);
            }
            debug!("master mute engaged on {} outputs", outputs.len());
            return Ok(());
        }

        let reads: Vec<_> = outputs
            .iter()
            .flat_map(|path| [path.volume_read(), path.mute_read()])
            .collect();
        ReadDevice::new(transport, cache, failed_reads)
            .run(&reads)
            .await?;

        let builder = SnapshotBuilder::new(cache);
        for path in outputs {
            builder.path(snapshot, path, false);
        }
        debug!("master mute released, outputs restored from device");

        Ok(())
    }
}

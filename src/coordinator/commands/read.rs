use crate::prelude::*;
use crate::catalog::ReadCommand;
use crate::parser;
use crate::transport::ensure_send;

/// Issues a batch of reads and caches the cleaned replies.
///
/// A read the device answers with an error banner is logged and recorded;
/// its cache entry keeps the previous value and the batch carries on.
/// Session faults and login failures abort the batch.
pub struct ReadDevice<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    cache: &'a mut ResponseCache,
    failed_reads: &'a mut HashMap<String, String>,
}

impl<'a, T: Transport + ?Sized> ReadDevice<'a, T> {
    pub fn new(
        transport: &'a mut T,
        cache: &'a mut ResponseCache,
        failed_reads: &'a mut HashMap<String, String>,
    ) -> Self {
        Self {
            transport,
            cache,
            failed_reads,
        }
    }

    /// Returns how many reads landed in the cache.
    pub async fn run(&mut self, reads: &[ReadCommand]) -> Result<usize, BridgeError> {
        let mut stored = 0;

        for read in reads {
            match ensure_send(&mut *self.transport, &read.command).await {
                Ok(raw) => {
                    self.cache.put(read.key.as_str(), parser::clean_response(&raw));
                    self.failed_reads.remove(&read.command);
                    stored += 1;
                }
                Err(TransportError::ErrorBanner(reply)) => {
                    error!("Error when get command: {}: {:?}", read.command, reply);
                    self.failed_reads.insert(read.command.clone(), reply);
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!("read {}/{} commands", stored, reads.len());
        Ok(stored)
    }
}

use crate::prelude::*;
use crate::transport::ensure_send;

/// Fire-and-forget reboot. The device does not print `OK` for it, so any
/// non-empty reply without a syntax error counts.
pub struct Reboot {
    command: String,
}

impl Reboot {
    pub fn new(command: String) -> Self {
        Self { command }
    }

    pub async fn run<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<(), BridgeError> {
        info!("[reboot] sending {:?}", self.command);

        let response = match ensure_send(transport, &self.command).await {
            Ok(response) => response,
            Err(TransportError::ErrorBanner(response)) => {
                return Err(BridgeError::Rejected {
                    key: catalog::SYSTEM_REBOOT.to_string(),
                    response,
                })
            }
            Err(e) => return Err(e.into()),
        };

        if response.trim().is_empty() || response.contains(catalog::SYNTAX_ERROR) {
            return Err(BridgeError::Rejected {
                key: catalog::SYSTEM_REBOOT.to_string(),
                response,
            });
        }

        Ok(())
    }
}

use crate::prelude::*;
use crate::transport::ensure_send;

/// Sends one write and checks the device acknowledged it.
pub struct WriteControl<'a> {
    key: &'a str,
    command: String,
}

impl<'a> WriteControl<'a> {
    pub fn new(key: &'a str, command: String) -> Self {
        Self { key, command }
    }

    pub async fn run<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<String, BridgeError> {
        info!("[write] {} -> {:?}", self.key, self.command);

        let response = match ensure_send(transport, &self.command).await {
            Ok(response) => response,
            Err(TransportError::ErrorBanner(response)) => return Err(self.rejected(response)),
            Err(e) => return Err(e.into()),
        };

        if response.trim().is_empty()
            || response.contains(catalog::SYNTAX_ERROR)
            || !response.contains(catalog::WRITE_OK)
        {
            return Err(self.rejected(response));
        }

        Ok(response)
    }

    fn rejected(&self, response: String) -> BridgeError {
        BridgeError::Rejected {
            key: self.key.to_string(),
            response,
        }
    }
}

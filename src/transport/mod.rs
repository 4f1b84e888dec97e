use crate::prelude::*;

use async_trait::async_trait;
use std::ops::{Deref, DerefMut};

pub mod decoder;
pub mod tcp;

pub use decoder::PromptDecoder;
pub use tcp::TcpTransport;

/// One exclusive command session with the device.
///
/// `send` takes the bare command text; implementations add the line
/// terminator and return everything the device printed before its prompt.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    async fn send(&mut self, command: &str) -> Result<String, TransportError>;

    fn timeout(&self) -> Duration;

    fn set_timeout(&mut self, timeout: Duration);

    async fn disconnect(&mut self);
}

/// Narrows the transport timeout for the guard's lifetime and restores the
/// previous value when dropped, however the scope is left.
pub struct TimeoutGuard<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    restore: Duration,
}

impl<'a, T: Transport + ?Sized> TimeoutGuard<'a, T> {
    pub fn new(transport: &'a mut T, timeout: Duration) -> Self {
        let restore = transport.timeout();
        trace!("transport timeout {:?} -> {:?}", restore, timeout);
        transport.set_timeout(timeout);
        Self { transport, restore }
    }
}

impl<T: Transport + ?Sized> Deref for TimeoutGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.transport
    }
}

impl<T: Transport + ?Sized> DerefMut for TimeoutGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.transport
    }
}

impl<T: Transport + ?Sized> Drop for TimeoutGuard<'_, T> {
    fn drop(&mut self) {
        trace!("transport timeout restored to {:?}", self.restore);
        self.transport.set_timeout(self.restore);
    }
}

/// Connects if needed, then sends.
pub async fn ensure_send<T: Transport + ?Sized>(
    transport: &mut T,
    command: &str,
) -> Result<String, TransportError> {
    if !transport.is_connected() {
        transport.connect().await?;
    }
    debug!("-> {}", command);
    let response = transport.send(command).await?;
    trace!("<- {:?}", response);
    Ok(response)
}

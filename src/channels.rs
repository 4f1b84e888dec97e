use crate::prelude::*;

/// Requests and results passed between the scheduler and its peers.
#[derive(Debug, Clone)]
pub enum ChannelData {
    /// Write `value` to the property `key`.
    Control(String, String),
    /// Switch between full and monitoring mode.
    ConfigManagement(bool),
    /// A snapshot produced by a poll.
    Snapshot(Arc<Snapshot>),
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct Channels {
    pub to_scheduler: broadcast::Sender<ChannelData>,
    pub from_scheduler: broadcast::Sender<ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            to_scheduler: Self::channel(),
            from_scheduler: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }

    pub fn shutdown(&self) {
        let _ = self.to_scheduler.send(ChannelData::Shutdown);
        let _ = self.from_scheduler.send(ChannelData::Shutdown);
    }
}

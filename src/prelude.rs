pub use anyhow::{anyhow, bail, Error, Result};
pub use log::{debug, error, info, trace, warn};

pub use std::collections::{BTreeMap, HashMap};
pub use std::io::Write;
pub use std::str::FromStr;
pub use std::sync::Arc;
pub use std::time::Duration;

pub use tokio::sync::broadcast;

pub use crate::{
    bridge::Bridge,
    catalog,
    channels::Channels,
    config::{self, Config, ConfigWrapper},
    error::{BridgeError, TransportError},
    options::Options,
    response_cache::ResponseCache,
    snapshot::{Control, ControllableElement, Snapshot},
    transport::Transport,
};

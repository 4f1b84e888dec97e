// Module declarations for the application's core components
pub mod bridge;          // Polling and control engine
pub mod catalog;         // Device vocabulary: keys, commands, audio paths
pub mod channels;        // Inter-component communication channels
pub mod command;         // Control key resolution and write commands
pub mod config;          // Configuration management
pub mod control_input;   // stdin control requests
pub mod coordinator;     // Control execution against the device
pub mod cycle;           // Staged refresh state machine
pub mod error;           // Error handling and types
pub mod options;         // Command line options parsing
pub mod parser;          // Device response parsing
pub mod prelude;         // Common imports and types
pub mod response_cache;  // Last raw response per read
pub mod scheduler;       // Periodic polling
pub mod snapshot;        // Properties and controls handed to callers
pub mod snapshot_writer; // JSON lines snapshot log
pub mod transport;       // Device session

// Get the package version from Cargo.toml
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::bridge::BridgeSettings;
use crate::control_input::ControlInput;
use crate::scheduler::Scheduler;
use crate::snapshot_writer::SnapshotWriter;
use crate::transport::TcpTransport;

use tokio::task::JoinHandle;

/// Installs the logger. Everything is let through env_logger; the level is
/// narrowed with `log::set_max_level` so the config can change it later.
/// `RUST_LOG`, when set, wins over both.
pub fn init_logger() {
    let rust_log = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();

    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init();

    if let Err(e) = result {
        eprintln!("logger already initialised: {}", e);
        return;
    }
    if !rust_log {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// Applies the configured log level unless `RUST_LOG` is set.
pub fn set_loglevel(level: &str) {
    if std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some() {
        return;
    }
    match log::LevelFilter::from_str(level) {
        Ok(filter) => log::set_max_level(filter),
        Err(_) => warn!("invalid loglevel {:?}, keeping {}", level, log::max_level()),
    }
}

/// Running tasks, stopped in reverse start order.
pub struct Components {
    pub channels: Channels,
    pub scheduler: JoinHandle<()>,
    pub snapshot_writer: Option<JoinHandle<()>>,
    pub control_input: JoinHandle<()>,
}

impl Components {
    pub async fn stop(self) {
        info!("Stopping all components...");

        // stdin reads never return on their own
        self.control_input.abort();

        self.channels.shutdown();

        if let Err(e) = self.scheduler.await {
            error!("Error waiting for scheduler task: {}", e);
        }
        if let Some(handle) = self.snapshot_writer {
            if let Err(e) = handle.await {
                error!("Error waiting for snapshot writer task: {}", e);
            }
        }

        info!("Shutdown complete");
    }
}

/// Main application entry point
pub async fn app(
    mut shutdown_rx: broadcast::Receiver<()>,
    config: ConfigWrapper,
    options: Options,
) -> Result<()> {
    info!("nano-bridge {} starting", CARGO_PKG_VERSION);
    set_loglevel(&config.loglevel());

    let channels = Channels::new();

    let device = config.device();
    info!("  Creating bridge for {}:{}...", device.host(), device.port());
    let transport = TcpTransport::new(device);
    let bridge = Arc::new(Bridge::new(transport, BridgeSettings::from_config(&config)));
    let scheduler = Arc::new(Scheduler::new(config.clone(), channels.clone(), bridge));

    if options.once {
        return once(&scheduler).await;
    }

    // subscribe consumers before the scheduler publishes anything
    let snapshot_writer = match config.snapshot_file() {
        Some(path) => {
            info!("  Creating SnapshotWriter...");
            let writer = SnapshotWriter::new(&path)?;
            let channels = channels.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = writer.start(channels).await {
                    error!("SnapshotWriter task failed: {}", e);
                }
            }))
        }
        None => None,
    };

    info!("  Creating Scheduler...");
    let scheduler_handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move {
            if let Err(e) = scheduler.start().await {
                error!("Scheduler task failed: {}", e);
            }
        })
    };

    info!("  Creating ControlInput...");
    let control_input = {
        let input = ControlInput::new(channels.clone());
        tokio::spawn(async move {
            if let Err(e) = input.start().await {
                error!("ControlInput task failed: {}", e);
            }
        })
    };

    let components = Components {
        channels,
        scheduler: scheduler_handle,
        snapshot_writer,
        control_input,
    };

    info!("Waiting for shutdown signal...");
    tokio::select! {
        _ = shutdown_rx.recv() => info!("Shutdown signal received, stopping components..."),
        _ = runtime_limit(options.runtime) => info!("Runtime limit reached, stopping components..."),
    }

    components.stop().await;
    info!("Application shutdown complete");
    Ok(())
}

async fn runtime_limit(runtime: Option<u64>) {
    match runtime {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => std::future::pending().await,
    }
}

/// Polls until a populated snapshot comes back (the first full-mode call is
/// always empty) and prints it.
async fn once<T: Transport>(scheduler: &Scheduler<T>) -> Result<()> {
    let mut printed = false;

    for _ in 0..2 {
        match scheduler.poll().await {
            Some(snapshot) if !snapshot.is_empty() => {
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
                printed = true;
                break;
            }
            Some(_) => continue,
            None => break,
        }
    }

    scheduler.stop().await;

    if !printed {
        bail!("no snapshot could be read from the device");
    }
    Ok(())
}

use clap::Parser;
use log::{debug, error, info, warn};
use pool_homekit_bridge::bridge::SyncEngine;
use pool_homekit_bridge::config::{Config, load_dotenv};
use pool_homekit_bridge::controller::{SimulatedController, run_simulation};
use pool_homekit_bridge::error::Result;
use pool_homekit_bridge::hap::{Accessory, AttributeDatabase, ChannelNotifier, Registry};
use pool_homekit_bridge::instance_lock::{InstanceLock, InstanceLockError};
use pool_homekit_bridge::pairing::setup_uri;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[derive(Parser)]
#[command(name = "pool-homekit-bridge")]
#[command(about = "Expose a pool controller as a HomeKit accessory")]
struct Cli {
    /// Print the attribute database as JSON and exit
    #[arg(long)]
    dump_database: bool,

    /// Seconds between simulated controller ticks
    #[arg(long, env = "BRIDGE_SIMULATION_INTERVAL_SECS")]
    simulation_interval: Option<u64>,

    /// Skip the single instance check
    #[arg(long)]
    no_instance_lock: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Before the runtime starts: `.env` values are written into the process environment
    load_dotenv();
    init_logger();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("[Bridge] Failed to start tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        error!("[Bridge] {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("[Bridge] Starting Pool HomeKit Bridge");

    let mut config = Config::from_env();
    if let Some(interval) = cli.simulation_interval {
        config.bridge.simulation_interval_secs = interval;
    }
    config.validate()?;

    let setup_code = config.setup_code()?;
    let setup_id = config.setup_id()?;
    info!("[Bridge] Configuration loaded:");
    info!("  Accessory: {}", config.accessory.name);
    info!("  Model: {} ({})", config.accessory.model, config.accessory.serial_number);
    info!("  Firmware: {}", config.accessory.firmware_revision);
    info!("  Write timeout: {}ms", config.bridge.write_timeout_ms);
    if setup_code.is_trivial() {
        warn!(
            "[Bridge] Setup code {} is trivial; iOS will refuse to pair. Set HAP_SETUP_CODE.",
            setup_code
        );
    }

    let _lock = if cli.no_instance_lock || cli.dump_database {
        None
    } else {
        match InstanceLock::acquire() {
            Ok(lock) => Some(lock),
            Err(InstanceLockError::AlreadyRunning) => {
                error!(
                    "[Bridge] Another instance is already running ({})",
                    InstanceLock::socket_path().display()
                );
                process::exit(1);
            }
            Err(InstanceLockError::Io(e)) => return Err(e.into()),
        }
    };

    let controller = Arc::new(SimulatedController::default());
    let (notifier, mut notifications) = ChannelNotifier::channel();
    let engine = SyncEngine::with_write_timeout(
        Arc::new(Registry::new()),
        controller.clone(),
        Arc::new(notifier),
        Duration::from_millis(config.bridge.write_timeout_ms),
    );
    engine.prime();

    let accessory = Accessory::build(&config.accessory, &engine);
    debug!("[HAP] Schema hash {:016x}", accessory.schema_hash());

    if cli.dump_database {
        println!("{}", AttributeDatabase::snapshot(&accessory).to_json_pretty()?);
        return Ok(());
    }

    info!(
        "[HAP] Setup code {} / {}",
        setup_code,
        setup_uri(setup_code, &setup_id, accessory.category())
    );

    // Stand-in for the HAP server's event delivery
    let notify_task = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            info!(
                "[HAP] Event {} = {}",
                notification.quantity, notification.value
            );
        }
    });

    let simulation_task = run_simulation(
        controller,
        Duration::from_secs(config.bridge.simulation_interval_secs),
    );

    info!("[Bridge] Pool HomeKit Bridge is running");
    info!("  - {} characteristics exposed", accessory.characteristics().count());
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => info!("[Bridge] Received shutdown signal"),
        Err(e) => error!("[Bridge] Failed to listen for shutdown signal: {}", e),
    }

    simulation_task.abort();
    notify_task.abort();

    info!("[Bridge] Pool HomeKit Bridge stopped");
    Ok(())
}

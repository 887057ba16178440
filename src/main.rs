mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, Target};
use std::process;
use std::time::Duration;
use tokio::{signal, sync::mpsc};
use tracing::{error, info, warn};
use vento_lib::device::lock_device;
use vento_lib::{Device, VentoClient};

/// Time allowed for the unit to confirm a command.
const CONFIRM_WAIT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = cli::setup_logging(cli.log_file.as_ref(), &cli.verbose)?;

    tokio::select! {
        res = run(cli) => {
            if let Err(e) = res {
                error!("Command failed: {:?}", e);
                process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down.");
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let client = VentoClient::new(cli.client_config())
        .await
        .context("Failed to open UDP socket")?;

    let result = match &cli.command {
        Command::Discover { wait } => discover(&client, Duration::from_secs(*wait)).await,
        command => match command.target() {
            Some(target) => control(&client, target, command).await,
            None => Ok(()),
        },
    };

    client.close().await;
    result
}

async fn discover(client: &VentoClient, wait: Duration) -> Result<()> {
    client
        .discover(|id: &str, address| println!("{id}  {}", address.ip()))
        .await
        .context("Failed to send search")?;
    tokio::time::sleep(wait).await;

    let found = client.finish_discovery();
    info!(count = found.len(), "Search finished");
    if found.is_empty() {
        warn!(
            "No units answered. Check the broadcast address and that UDP port {} is reachable.",
            client.config().device_port
        );
    }
    Ok(())
}

async fn control(client: &VentoClient, target: &Target, command: &Command) -> Result<()> {
    let device = client
        .validate(&target.id, &target.password, target.address)
        .await
        .with_context(|| format!("Unit {} not found at {}", target.id, target.address))?;
    info!(device_id = %device.device_id, address = %device.address, "Unit found");

    let (tx, mut updates) = mpsc::unbounded_channel::<Device>();
    let handle = client
        .register(
            device,
            Some(std::sync::Arc::new(move |device: &Device| {
                let _ = tx.send(device.clone());
            })),
        )
        .await
        .context("Failed to register unit")?;

    let id = target.id.as_str();
    match command {
        Command::Status(_) | Command::Firmware(_) | Command::Discover { .. } => {}
        Command::On(_) => client.turn_on(id).await?,
        Command::Off(_) => client.turn_off(id).await?,
        Command::Speed { speed, .. } => client.set_speed(id, (*speed).into()).await?,
        Command::ManualSpeed { value, .. } => {
            client.set_manual_speed(id, *value).await?;
            client.set_speed(id, vento_lib::Speed::Manual).await?;
        }
        Command::Mode { mode, .. } => client.set_mode(id, (*mode).into()).await?,
        Command::ResetFilter(_) => {
            client.reset_filter_alarm(id).await?;
            client.request_status(id).await?;
        }
        Command::SyncClock(_) => {
            let now = chrono::Local::now().naive_local();
            info!(time = %now, "Setting unit clock");
            client.set_clock(id, now).await?;
        }
    }

    // Collect confirmations until the unit goes quiet
    while let Ok(Some(_)) = tokio::time::timeout(CONFIRM_WAIT, updates.recv()).await {}

    let device = lock_device(&handle).clone();
    match command {
        Command::Firmware(_) => print_firmware(&device),
        _ => println!("{}", device.state),
    }
    Ok(())
}

fn print_firmware(device: &Device) {
    let state = &device.state;
    println!("Device id:        {}", device.device_id);
    println!(
        "Firmware version: {}",
        state.firmware_version().unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Firmware date:    {}",
        state.firmware_date().unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Unit type:        {}",
        state.unit_type.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    );
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::fs::File;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vento_lib::constants::DEVICE_PORT;
use vento_lib::{ClientConfig, Mode, Speed};

/// Control Blauberg/Vents Vento Expert ventilation units on the local network.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Local address to bind the UDP socket to.
    #[arg(long, default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,
    /// UDP port the units listen on.
    #[arg(long, default_value_t = DEVICE_PORT)]
    pub port: u16,
    /// Broadcast address used for searching.
    #[arg(long, default_value = "255.255.255.255")]
    pub broadcast: Ipv4Addr,
    /// How long to wait for a unit to answer, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_bind_addr(self.bind)
            .with_device_port(self.port)
            .with_broadcast_addr(self.broadcast)
            .with_validate_timeout(Duration::from_millis(self.timeout_ms))
    }
}

/// The unit a command is sent to.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Device id, 16 characters as shown in the mobile app.
    #[arg(short, long)]
    pub id: String,
    /// Device password.
    #[arg(short, long, default_value = "1111")]
    pub password: String,
    /// Address of the unit. The broadcast address finds it anywhere on the subnet.
    #[arg(short = 'a', long, default_value = "255.255.255.255")]
    pub address: IpAddr,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the network for units.
    Discover {
        /// Seconds to collect replies.
        #[arg(short, long, default_value_t = 4)]
        wait: u64,
    },
    /// Show the current state of a unit.
    Status(Target),
    /// Show firmware version and unit type.
    Firmware(Target),
    /// Switch a unit on.
    On(Target),
    /// Switch a unit off.
    Off(Target),
    /// Select a fan speed.
    Speed {
        #[command(flatten)]
        target: Target,
        #[arg(value_enum)]
        speed: SpeedArg,
    },
    /// Set the manual fan speed (0-255) and switch to manual speed.
    ManualSpeed {
        #[command(flatten)]
        target: Target,
        value: u8,
    },
    /// Select the ventilation mode.
    Mode {
        #[command(flatten)]
        target: Target,
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Restart the filter replacement countdown.
    ResetFilter(Target),
    /// Set the unit clock to the local time of this machine.
    SyncClock(Target),
}

impl Command {
    pub fn target(&self) -> Option<&Target> {
        match self {
            Command::Discover { .. } => None,
            Command::Status(target)
            | Command::Firmware(target)
            | Command::On(target)
            | Command::Off(target)
            | Command::ResetFilter(target)
            | Command::SyncClock(target) => Some(target),
            Command::Speed { target, .. } | Command::ManualSpeed { target, .. } | Command::Mode { target, .. } => {
                Some(target)
            }
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum SpeedArg {
    Low,
    Medium,
    High,
    Manual,
}

impl From<SpeedArg> for Speed {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Low => Speed::Low,
            SpeedArg::Medium => Speed::Medium,
            SpeedArg::High => Speed::High,
            SpeedArg::Manual => Speed::Manual,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Ventilation,
    HeatRecovery,
    Supply,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Ventilation => Mode::Ventilation,
            ModeArg::HeatRecovery => Mode::HeatRecovery,
            ModeArg::Supply => Mode::Supply,
        }
    }
}

pub fn setup_logging(log_file_path: Option<&PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = if let Some(path) = log_file_path {
        let log_file = File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    // -v gives DEBUG, -vv TRACE; RUST_LOG overrides per target
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

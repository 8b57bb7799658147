//! busylightd - Kuando Busylight daemon
//!
//! Opens a Busylight, keeps it alive and applies newline-delimited commands
//! read from stdin, so any message-bus bridge can drive the light by piping
//! payloads into it.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

use std::io::{self, BufReader};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use busylight_engine::{BusylightConfig, Dispatcher, SharedTransport, list_devices};
use busylight_service::{
    CommandLoop, DeviceSelection, abort_startup, parse_hex_id, spawn_line_reader,
};
use clap::{Args, Parser, Subcommand};
use crossbeam::channel::bounded;
use hidapi::HidApi;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "busylightd")]
#[command(about = "Kuando Busylight daemon - drive a Busylight from text commands")]
#[command(version)]
#[command(long_about = "
busylightd drives a Kuando Busylight Alpha or Omega over USB HID.

`run` reads one command per line from stdin (color_red, blink_color_blue,
ring_funky, rainbow_on, fade_green, raw_color 10,20,30, off, ...) until end
of input or Ctrl-C, then switches the light off.
")]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.config/busylight/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply commands read from stdin until EOF or Ctrl-C
    Run {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// List attached HID devices
    List {
        /// Include devices that are not Busylights
        #[arg(long)]
        all: bool,

        /// Output in JSON format for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Apply the given commands once and exit
    Send {
        #[command(flatten)]
        device: DeviceArgs,

        /// Keep effects running this long before exiting
        #[arg(long, default_value = "0", value_name = "MS")]
        hold_ms: u64,

        /// Commands to apply, in order
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

#[derive(Args)]
struct DeviceArgs {
    /// Vendor ID (hex, e.g. 0x27BB). Requires --pid.
    #[arg(long, value_name = "HEX")]
    vid: Option<String>,

    /// Product ID (hex, e.g. 0x3BCF). Requires --vid.
    #[arg(long, value_name = "HEX")]
    pid: Option<String>,
}

impl DeviceArgs {
    fn selection(&self, config: &BusylightConfig) -> Result<DeviceSelection> {
        let vid = self.vid.as_deref().map(parse_hex_id).transpose()?;
        let pid = self.pid.as_deref().map(parse_hex_id).transpose()?;
        DeviceSelection::resolve(vid, pid, &config.device)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "busylightd={log_level},busylight_service={log_level},busylight_engine={log_level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Run { device } => run(&config, &device),
        Commands::List { all, json } => list(all, json),
        Commands::Send {
            device,
            hold_ms,
            commands,
        } => send(&config, &device, hold_ms, &commands),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<BusylightConfig> {
    let path = match path {
        Some(path) => path,
        None => BusylightConfig::default_config_path()?,
    };
    let config = BusylightConfig::load_from_path(&path)
        .with_context(|| format!("failed to load config '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config '{}'", path.display()))?;
    Ok(config)
}

fn open_dispatcher(config: &BusylightConfig, device: &DeviceArgs) -> Result<Dispatcher> {
    let selection = device.selection(config)?;
    let api = HidApi::new().context("failed to initialise HID API")?;
    let transport = SharedTransport::new(selection.open(&api)?);
    info!("Using {}", transport.description());
    Ok(Dispatcher::new(transport, config))
}

fn run(config: &BusylightConfig, device: &DeviceArgs) -> Result<()> {
    let mut dispatcher = open_dispatcher(config, device)?;

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    let handler = ctrlc::set_handler(move || {
        if shutdown_tx.try_send(()).is_err() {
            debug!("Shutdown already pending");
        }
    });
    if let Err(e) = handler {
        let error = anyhow::Error::new(e).context("failed to install Ctrl-C handler");
        return Err(abort_startup(dispatcher, error));
    }

    if config.keep_alive.enabled
        && let Err(e) = dispatcher.start_keep_alive()
    {
        let error = anyhow::Error::new(e).context("failed to start keep-alive");
        return Err(abort_startup(dispatcher, error));
    }

    let commands = match spawn_line_reader(BufReader::new(io::stdin())) {
        Ok(commands) => commands,
        Err(e) => {
            let error = anyhow::Error::new(e).context("failed to start command reader");
            return Err(abort_startup(dispatcher, error));
        }
    };
    info!("Reading commands from stdin (Ctrl-C to stop)");

    let summary = CommandLoop::new(commands, shutdown_rx).run(&mut dispatcher);
    debug!("Stopped by {:?}", summary.stopped_by);

    dispatcher.shutdown().context("shutdown failed")?;
    info!("Busylight switched off");
    Ok(())
}

fn send(config: &BusylightConfig, device: &DeviceArgs, hold_ms: u64, commands: &[String]) -> Result<()> {
    let mut dispatcher = open_dispatcher(config, device)?;

    let mut failures = 0usize;
    for command in commands {
        match dispatcher.handle(command) {
            Ok(outcome) => info!("{}: {:?}", command, outcome),
            Err(e) => {
                warn!("{}: {}", command, e);
                failures += 1;
            }
        }
    }

    if hold_ms > 0 {
        thread::sleep(Duration::from_millis(hold_ms));
    }
    dispatcher.release().context("failed to release device")?;

    if failures > 0 {
        bail!("{failures} of {} command(s) failed", commands.len());
    }
    Ok(())
}

fn list(all: bool, json: bool) -> Result<()> {
    let api = HidApi::new().context("failed to initialise HID API")?;
    let devices: Vec<_> = list_devices(&api)
        .into_iter()
        .filter(|d| all || d.busylight.is_some())
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No Busylight devices found");
        return Ok(());
    }

    for d in &devices {
        println!(
            "{:04X}:{:04X}  {:<20}  {}",
            d.vendor_id,
            d.product_id,
            d.busylight.unwrap_or("-"),
            d.product.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fleetwatch::app::App;
use fleetwatch::config::Settings;
use fleetwatch::render;
use fleetwatch::source::FeedEvent;
use fleetwatch_client::{DeviceStatus, FleetClient, Protocol, RegisterDevice};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fleetwatch")]
#[command(about = "Monitor a fleet of devices and their live diagnostics")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides configuration)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered devices
    Devices,
    /// Register a device
    Register {
        device_id: String,
        #[arg(long, default_value = "")]
        alias: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u32,
        #[arg(long, default_value_t = 0)]
        port_gateway: u32,
        /// Protocol, e.g. "http-stream" or "PROTOCOL_GRPC"
        #[arg(long, default_value = "http")]
        protocol: Protocol,
    },
    /// Change the status of a device
    SetStatus {
        device_id: String,
        /// Status, e.g. "maintenance" or "DEVICE_STATUS_OFFLINE"
        status: DeviceStatus,
    },
    /// Stream live diagnostics until Ctrl-C or every stream ends
    Watch {
        #[arg(required = true)]
        device_ids: Vec<String>,
        /// Write the final state as JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(timeout) = cli.timeout {
        settings.request_timeout_secs = timeout;
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.log_level).context("invalid log level")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    debug!("Settings: {:?}", settings);

    let client = FleetClient::builder()
        .endpoint(&settings.endpoint)
        .timeout(settings.request_timeout())
        .build()
        .context("invalid endpoint")?;
    let mut app = App::new(client);

    match cli.command {
        Command::Devices => {
            app.refresh_devices().await?;
            match cli.format {
                OutputFormat::Text => println!("{}", render::device_table(&app.store)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(app.store.devices())?)
                }
            }
        }
        Command::Register {
            device_id,
            alias,
            host,
            port,
            port_gateway,
            protocol,
        } => {
            let request = RegisterDevice {
                device_id,
                alias,
                host,
                port,
                port_gateway,
                protocol,
            };
            let device = app.register(&request).await?;
            match cli.format {
                OutputFormat::Text => println!(
                    "Registered {} ({}) at {}",
                    device.device_id,
                    device.display_name(),
                    device.address()
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&device)?),
            }
        }
        Command::SetStatus { device_id, status } => {
            app.update_status(&device_id, status).await?;
            if cli.format == OutputFormat::Text {
                println!("{device_id} is now {}", status.label());
            }
        }
        Command::Watch { device_ids, export } => {
            watch(&mut app, &device_ids, cli.format).await?;
            if let Some(path) = export {
                app.export_to_file(&path)?;
            }
        }
    }

    Ok(())
}

async fn watch(app: &mut App, device_ids: &[String], format: OutputFormat) -> Result<()> {
    // The list is optional context; streams work without it.
    if let Err(e) = app.refresh_devices().await {
        info!("Continuing without device list: {:#}", e);
    }

    for device_id in device_ids {
        app.watch(device_id);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, stopping {} streams", app.streams().len());
                break;
            }
            Some(event) = app.next_event() => {
                print_event(app, event, format)?;
            }
            _ = tick.tick() => {
                if app.all_streams_finished() {
                    break;
                }
            }
        }
    }

    app.stop_all().await;
    while let Some(event) = app.poll_event() {
        print_event(app, event, format)?;
    }

    if format == OutputFormat::Text {
        for device_id in device_ids {
            if let Some(history) = app.store.history(device_id) {
                println!("{}", render::history_summary(device_id, history));
            }
        }
    }

    if let Some(error) = &app.last_error {
        if device_ids.iter().all(|id| app.store.history(id).is_none()) {
            bail!("no diagnostics received ({error})");
        }
    }
    Ok(())
}

fn print_event(app: &mut App, event: FeedEvent, format: OutputFormat) -> Result<()> {
    let device_id = event.device_id().to_string();
    let is_record = matches!(event, FeedEvent::Diagnostics { .. });
    app.apply(event);

    if !is_record {
        if let Some(error) = &app.last_error {
            eprintln!("{error}");
        }
        return Ok(());
    }

    let Some(diagnostics) = app.store.diagnostics(&device_id) else {
        return Ok(());
    };
    match format {
        OutputFormat::Text => println!(
            "{}",
            render::sample_line(&device_id, diagnostics, app.store.history(&device_id))
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "device_id": device_id, "diagnostics": diagnostics })
        ),
    }
    Ok(())
}

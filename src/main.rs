use clap::Parser;
use serial_sensor_bridge::{
    config::{Config, ConfigLoader},
    logging,
    port::SerialOpener,
    rest_api::{build_router, cors_layer, RestContext},
    service::{BridgeSettings, SensorService},
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

// Command-line arguments. Anything given here wins over file and environment.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Serves the latest reading of a serial-attached environmental sensor over HTTP."
)]
struct Args {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device, e.g. COM9 or /dev/ttyACM0.
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate the sensor transmits at.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Address to bind the HTTP server to.
    #[arg(long)]
    host: Option<String>,

    /// Port for the HTTP server.
    #[arg(short, long)]
    port: Option<u16>,

    /// Browser origin allowed by CORS.
    #[arg(long)]
    cors_origin: Option<String>,

    /// Log filter directive, e.g. "debug".
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.serial.port = device.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(origin) = &self.cors_origin {
            config.server.cors_origin = origin.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config_path = loader.config_path.clone();
    let mut config = loader.into_config();
    args.apply(&mut config);
    config.validate()?;

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    logging::init(&config.logging)?;
    if let Some(path) = &config_path {
        info!(path = %path.display(), "Loaded configuration");
    }

    let service = SensorService::new(
        Box::new(SerialOpener),
        BridgeSettings::from_config(&config),
    );

    // A missing sensor at startup is not fatal; /data retries on demand.
    let startup = service.clone();
    let connected = tokio::task::spawn_blocking(move || startup.connect().success).await?;
    if !connected {
        warn!(
            port = %service.port_name(),
            "Sensor not available at startup; will retry on request"
        );
    }

    let cors = cors_layer(&config.server.cors_origin)?;
    let app = build_router(
        RestContext {
            service: service.clone(),
        },
        cors,
    );

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        port = %service.port_name(),
        baud = config.serial.baud_rate,
        "Sensor bridge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tokio::task::spawn_blocking(move || service.shutdown()).await?;
    info!("Serial link closed");

    Ok(())
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, starting graceful shutdown...");
}

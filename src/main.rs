use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use omnifeed_client::{sink_for, SinkConfig};
use omnifeed_core::config::{AppConfig, LogFormat, LoggingConfig};
use omnifeed_core::types::{Domain, Protocol, SymbologyType};
use omnifeed_filter::Classifier;
use omnifeed_source::{AisStreamSource, ObservationSource, OpenSkySource};
use omnifeed_supervisor::{inspect_position_reports, install_prometheus_exporter, Pipeline, Supervisor};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// OmniFeed - ADS-B and AIS to Cursor-on-Target bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/config.yaml")]
    config: PathBuf,

    /// Override destination host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override destination port
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Override transport protocol (tcp or udp)
    #[arg(long, global = true)]
    protocol: Option<Protocol>,

    /// Forward only these types (comma separated aliases or CoT codes)
    #[arg(long, global = true)]
    include: Option<String>,

    /// Drop these types (comma separated aliases or CoT codes)
    #[arg(long, global = true)]
    exclude: Option<String>,

    /// AISstream API key
    #[arg(long, global = true, env = "AISSTREAM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forward OpenSky aircraft states
    Adsb,
    /// Forward AISstream vessel reports
    Ais,
    /// Print raw position reports next to their CoT documents without forwarding
    AisInspect {
        /// Stop after this many position reports
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
    /// List filter aliases and CoT codes
    Types,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Both TLS clients share one rustls build; pick its provider up front
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider already installed");
    }

    let cli = Cli::parse();

    if let Command::Types = cli.command {
        print_types();
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&config.logging)?;

    if let Some(listen) = &config.metrics.listen {
        let listen: SocketAddr = listen
            .parse()
            .with_context(|| format!("Invalid metrics listen address: {}", listen))?;
        install_prometheus_exporter(listen)?;
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let result = match cli.command {
        Command::Adsb => {
            let source = OpenSkySource::new(config.aerial.clone())?;
            run_feed(&config, Box::new(source), cancel).await
        }
        Command::Ais => {
            let source = AisStreamSource::new(config.maritime.clone())?;
            run_feed(&config, Box::new(source), cancel).await
        }
        Command::AisInspect { count } => inspect_ais(&config, count, cancel).await,
        Command::Types => Ok(()),
    };

    if let Err(e) = &result {
        error!(error = format!("{:#}", e), "OmniFeed stopped with an error");
    }
    result
}

/// File and environment first, then command-line overrides, then validation
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_config_builder(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    if let Some(host) = &cli.host {
        config.destination.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.destination.port = port;
    }
    if let Some(protocol) = cli.protocol {
        config.destination.protocol = protocol;
    }
    if let Some(include) = &cli.include {
        config.filter.include = split_list(include);
    }
    if let Some(exclude) = &cli.exclude {
        config.filter.exclude = split_list(exclude);
    }
    if let Some(key) = &cli.api_key {
        config.maritime.api_key = Some(key.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let level = logging.parse_level()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn run_feed(
    config: &AppConfig,
    source: Box<dyn ObservationSource>,
    cancel: CancellationToken,
) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let sink = sink_for(SinkConfig::from(&config.destination));

    info!(
        source = source.name(),
        destination = %config.destination.address(),
        protocol = %config.destination.protocol,
        "Starting feed"
    );

    let mut supervisor = Supervisor::new(source, sink, pipeline);
    let report = supervisor.run(cancel).await?;

    info!(
        batches = report.batches,
        observations = report.observations,
        forwarded = report.forwarded,
        filtered = report.filtered,
        source_failures = report.source_failures,
        source_rejections = report.source_rejections,
        send_failures = report.send_failures,
        bytes_sent = report.bytes_sent,
        "Feed stopped"
    );
    Ok(())
}

async fn inspect_ais(config: &AppConfig, count: usize, cancel: CancellationToken) -> Result<()> {
    let classifier = Classifier::with_config(&config.classifier);
    let mut source = AisStreamSource::new(config.maritime.clone())?;
    let mut stdout = std::io::stdout();
    let printed = inspect_position_reports(&mut source, &classifier, count, &mut stdout, &cancel).await?;
    info!(printed, "Inspection finished");
    Ok(())
}

fn print_types() {
    for domain in [Domain::Aerial, Domain::Maritime] {
        println!("{}:", domain);
        for symbology in SymbologyType::for_domain(domain) {
            println!(
                "  {:<10} {:<14} {}",
                symbology.alias(),
                symbology.cot_type(),
                symbology.description()
            );
        }
    }
}

/// Fires `cancel` on Ctrl-C or SIGTERM
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
    cancel.cancel();
}

//! Magline Server Binary
//!
//! ## Usage
//!
//! ```bash
//! magline --config magline.toml
//! magline --generate-key identity.pem
//! magline --key identity.pem --port 9757
//! ```

use clap::Parser;
use magline_server::{generate_identity_file, MaglineServer, Options, OptionsBuilder};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Magline server holding an X25519 identity key
#[derive(Parser, Debug)]
#[command(name = "magline")]
#[command(version)]
#[command(about = "Magline server with an X25519 identity key", long_about = None)]
struct Args {
    /// Options file (.toml or .json)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Host, overrides the options file
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port, overrides the options file
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Private key PEM file, overrides the options file
    #[arg(short = 'k', long)]
    key: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Write a sample options file and exit
    #[arg(long)]
    generate_config: Option<PathBuf>,

    /// Write a new private key PEM file, print its public key and exit
    #[arg(long)]
    generate_key: Option<PathBuf>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn resolve_options(args: &Args) -> Result<Options, Box<dyn std::error::Error>> {
    let base = match &args.config {
        Some(path) => Options::load_from_file(path)?,
        None => Options::default(),
    };

    let mut builder = OptionsBuilder::from_options(base);
    if let Some(host) = &args.host {
        builder = builder.host(host);
    }
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    if let Some(key) = &args.key {
        builder = builder.private_key_path(key);
    }
    if let Some(level) = &args.log_level {
        builder = builder.log_level(level);
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.generate_config {
        Options::default().save_to_file(path)?;
        println!("Generated sample options at: {}", path.display());
        return Ok(());
    }

    if let Some(path) = &args.generate_key {
        let identity = generate_identity_file(path)?;
        println!("Wrote private key to: {}", path.display());
        print!("{}", identity.public_key_pem()?);
        return Ok(());
    }

    let options = resolve_options(&args)?;

    FmtSubscriber::builder()
        .with_max_level(parse_level(&options.log_level))
        .with_target(false)
        .compact()
        .init();

    if let Some(path) = &args.config {
        info!("Loaded options from: {}", path.display());
    }

    let server = Arc::new(MaglineServer::from_options(options)?);

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        signal_server.stop();
    });

    match server.run().await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Server error: {}", e);
            Err(e.into())
        }
    }
}

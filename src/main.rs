//! Binary entrypoint for the Meshwatch CLI.
//!
//! Commands:
//! - `start` - confirm the Meshtastic CLI is available, then poll until Ctrl-C
//! - `init` - write a starter `config.toml`
//! - `check` - report the detected Meshtastic CLI version
//! - `info` - poll once and print the parsed topology snapshot as JSON
//! - `traceroute <id>` - trace one node and print the parsed route as JSON
//!
//! See the library crate docs for module-level details: `meshwatch::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use meshwatch::config::Config;
use meshwatch::meshtastic::{
    check_cli, decode_id, encode_id, parse_node_info, parse_traceroute, MeshCli, MeshtasticCli,
};
use meshwatch::monitor::Monitor;

#[derive(Parser)]
#[command(name = "meshwatch")]
#[command(about = "Topology monitor for Meshtastic mesh networks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the radio and report topology changes
    Start,
    /// Write a default configuration file
    Init,
    /// Check that the Meshtastic CLI is installed
    Check,
    /// Fetch and print the current topology snapshot
    Info,
    /// Trace the route to one node (e.g. !ba4bf9d0)
    Traceroute {
        /// Node id in !hex form
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Start => {
            let (config, mesh) = load_config(&cli.config, cli.verbose).await?;
            info!("Starting Meshwatch v{}", env!("CARGO_PKG_VERSION"));
            if !check_cli(&mesh).await {
                return Err(anyhow!(
                    "Meshtastic CLI not available; is `{}` installed?",
                    config.meshtastic.cli_path
                ));
            }
            Monitor::from_config(mesh, &config).run().await?;
        }
        Commands::Check => {
            let (_, mesh) = load_config(&cli.config, cli.verbose).await?;
            if !check_cli(&mesh).await {
                std::process::exit(1);
            }
        }
        Commands::Info => {
            let (_, mesh) = load_config(&cli.config, cli.verbose).await?;
            let text = mesh.info().await?;
            let snapshot = parse_node_info(&text)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Traceroute { node } => {
            let (_, mesh) = load_config(&cli.config, cli.verbose).await?;
            // normalise e.g. "!BA4BF9D0" to the canonical lowercase form
            let node_id = encode_id(decode_id(&node)?);
            let result = match mesh.traceroute(&node_id).await {
                Ok(text) => parse_traceroute(&text),
                Err(e) => {
                    error!("Traceroute to {} failed: {}", node_id, e);
                    return Err(e.into());
                }
            };
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Load the config file, start logging from it and build the CLI runner.
async fn load_config(path: &str, verbosity: u8) -> Result<(Config, MeshtasticCli)> {
    let config = Config::load(path).await?;
    init_logging(&Some(config.clone()), verbosity);
    let mesh = MeshtasticCli::new(&config.meshtastic);
    Ok((config, mesh))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Foreground runs on a terminal also echo to the console
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}

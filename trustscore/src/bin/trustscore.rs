//! Operator CLI: probe dependencies, run the health monitor, check addresses.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use trustscore::health::{HealthMonitor, HealthRegistry};
use trustscore::monitoring::HealthView;
use trustscore::reputation::Address;
use trustscore::{TrustscoreOptions, init_logging};

#[derive(Parser)]
#[command(name = "trustscore")]
#[command(about = "Reputation pipeline operator tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every configured dependency once and print the health view.
    Health {
        /// JSON options file. Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Probe dependencies on the configured interval until Ctrl-C.
    Monitor {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check that an address is well formed and print its normalized form.
    Validate { address: String },
}

fn load_options(path: Option<PathBuf>) -> anyhow::Result<TrustscoreOptions> {
    match path {
        Some(path) => TrustscoreOptions::from_file(&path)
            .with_context(|| format!("loading {}", path.display())),
        None => {
            let mut options = TrustscoreOptions::default();
            options.apply_env();
            options.sanitize()?;
            Ok(options)
        }
    }
}

fn health_registry(options: &TrustscoreOptions) -> anyhow::Result<Arc<HealthRegistry>> {
    let health = Arc::new(HealthRegistry::new(&options.health));
    health
        .register_endpoints(&options.dependencies)
        .context("registering dependencies")?;
    Ok(health)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Health { config } => {
            let options = load_options(config)?;
            let _guard = init_logging(&options.logging)?;

            let health = health_registry(&options)?;
            let view = HealthView::from(&health.run_probe_cycle().await);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Monitor { config } => {
            let options = load_options(config)?;
            let _guard = init_logging(&options.logging)?;

            let health = health_registry(&options)?;
            if health.is_empty() {
                tracing::warn!("No dependencies configured; monitor will report healthy");
            }

            let monitor = HealthMonitor::spawn(health, None, options.health.probe_interval());
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
            monitor.shutdown().await;
        }
        Commands::Validate { address } => match Address::parse(&address) {
            Ok(address) => println!("{}", address),
            Err(e) => anyhow::bail!("{}", e),
        },
    }

    Ok(())
}

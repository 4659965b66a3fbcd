//! fast-reboot-dump
//!
//! Entry point for the fast-reboot state dump. Writes `fdb.json`, `arp.json`
//! and `default_routes.json` into the target directory, then re-announces the
//! dumped neighbors.
//!
//! Exit codes: 0 success, 1 interrupted, 2 failure, 3 target directory missing.
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - AU-3: Content of Audit Records - Structured logging
//! - AU-12: Audit Record Generation - Log run outcome
//! - CP-10: System Recovery - Fast-reboot state capture

use clap::Parser;
use sonic_fast_reboot_dump::error::EXIT_FAILURE;
use sonic_fast_reboot_dump::{
    pipeline, DumpConfig, DumpError, DumpSummary, Interrupt, RedisConnector, Result,
    DEFAULT_CONFIG_PATH,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Dump forwarding state before a fast reboot and re-announce neighbors
#[derive(Parser, Debug)]
#[command(name = "fast-reboot-dump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the JSON artifacts are written to (must exist)
    #[arg(short = 't', long = "target", default_value = "/tmp")]
    target: PathBuf,

    /// Configuration file; defaults apply when it does not exist
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Skip ARP/NDP announcements
    #[arg(long)]
    no_announce: bool,
}

/// Initialize structured logging to stderr, filtered by `RUST_LOG` (default `info`)
///
/// # NIST Controls
/// - AU-3: Content of Audit Records - Structured format
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| DumpError::Config(format!("Failed to set logger: {}", e)))?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging() {
        eprintln!("fast-reboot-dump: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let interrupt = match watch_sigint() {
        Ok(interrupt) => interrupt,
        Err(e) => {
            error!(error = %e, "fast-reboot-dump: Failed to install SIGINT handler");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    info!(target_dir = %args.target.display(), "fast-reboot-dump: Starting");

    // Store awaits are raced against the flag; synchronous sections check it
    let result = tokio::select! {
        result = run(&args, &interrupt) => result,
        () = interrupt.triggered() => Err(DumpError::Interrupted),
    };
    let result = result.and_then(|summary| interrupt.check().map(|()| summary));

    match result {
        Ok(summary) => {
            info!(
                fdb = summary.fdb_entries,
                neighbors = summary.neighbors,
                routes = summary.default_routes,
                announced = summary.announce.is_some(),
                "fast-reboot-dump: Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fast-reboot-dump: Failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// SIGINT sets the returned flag instead of killing the process
///
/// # NIST Controls
/// - SI-11: Error Handling - Interrupt observed during blocking sections
#[cfg(target_os = "linux")]
fn watch_sigint() -> Result<Interrupt> {
    Interrupt::sigint()
}

#[cfg(not(target_os = "linux"))]
fn watch_sigint() -> Result<Interrupt> {
    let interrupt = Interrupt::new();
    let listener = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            listener.trigger();
        }
    });
    Ok(interrupt)
}

async fn run(args: &Args, interrupt: &Interrupt) -> Result<DumpSummary> {
    let mut config = DumpConfig::load_or_default(&args.config)?;
    if args.no_announce {
        config.announce.enabled = false;
    }

    let connector = RedisConnector::new(config.database.clone());

    #[cfg(target_os = "linux")]
    {
        use sonic_fast_reboot_dump::announce::{PacketLinkLayer, SystemInterfaces};
        use sonic_fast_reboot_dump::Announcer;

        let host = SystemInterfaces::new();
        let link = PacketLinkLayer::new();
        let announcer = Announcer::new(&host, &link).with_ndp(config.announce.ndp);
        pipeline::run(&connector, &config, &args.target, Some(&announcer), interrupt).await
    }

    #[cfg(not(target_os = "linux"))]
    {
        if config.announce.enabled {
            tracing::warn!("Raw sockets are only supported on Linux, skipping announcements");
        }
        pipeline::run(&connector, &config, &args.target, None, interrupt).await
    }
}

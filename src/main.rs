// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::info;

use koetin::{EngineConfig, ProbeEngine};

/// Bountyy web vulnerability probe engine
#[derive(Parser, Debug)]
#[command(name = "koetin", version, about)]
struct Cli {
    /// Target URL to scan
    url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Overall scan deadline in seconds
    #[arg(long, default_value_t = 30)]
    deadline: u64,

    /// Permit loopback/private targets (lab and fixture use only)
    #[arg(long)]
    allow_private: bool,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = EngineConfig {
        request_timeout: Duration::from_secs(cli.timeout),
        scan_deadline: Duration::from_secs(cli.deadline),
        allow_private_targets: cli.allow_private,
        ..EngineConfig::default()
    };

    info!("Koetin probe engine v{} - starting", env!("CARGO_PKG_VERSION"));

    let engine = ProbeEngine::new(config)?;
    match engine.run_scan(&cli.url).await {
        Ok(report) => {
            let json = if cli.compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", json);
            Ok(())
        }
        // InvalidTarget / DisallowedHost: the HTTP layer maps these to 400.
        Err(err) => {
            eprintln!("scan rejected: {}", err);
            std::process::exit(1);
        }
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eks_bootstrap::bootstrap::bootstrap;
use eks_bootstrap::config::Config;
use eks_bootstrap::request::BootstrapRequest;

#[derive(Parser)]
#[command(name = "eks-bootstrap")]
#[command(about = "Bootstrap an EKS cluster with ArgoCD manifests and secrets", long_about = None)]
struct Cli {
    /// Invocation request JSON (reads stdin when omitted)
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("eks_bootstrap={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let raw = match &cli.event {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read event from stdin")?;
            buffer
        }
    };
    let request: BootstrapRequest =
        serde_json::from_str(&raw).context("invalid bootstrap request")?;

    let config = Config::from_env();
    let response = bootstrap(&config, request).await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}

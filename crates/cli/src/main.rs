// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vatti: debug CLI.
//!
//! One subcommand: render the chart values document for a launch message,
//! offline. Needs a dotenv file carrying the usual daemon settings.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vatti_chart::render_values;
use vatti_core::{JobRequest, Settings};

#[derive(Parser, Debug)]
#[command(name = "vatti", about = "Job-orchestration debug tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chart values file from a job launch message.
    ///
    /// Only really useful for debugging; the settings (secrets included)
    /// come from the dotenv file.
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Path to the launch message (JSON).
    #[arg(long)]
    message: PathBuf,
    /// Dotenv file with the daemon settings.
    #[arg(long)]
    env_file: PathBuf,
    /// Bucket name used for both the work and results paths.
    #[arg(long)]
    bucket: String,
    /// Where to write the rendered YAML.
    #[arg(long)]
    out: PathBuf,
}

fn render(args: &RenderArgs) -> anyhow::Result<()> {
    dotenvy::from_path(&args.env_file)
        .with_context(|| format!("couldn't load {}", args.env_file.display()))?;
    let settings = Settings::from_env()?;

    info!(message = %args.message.display(), "reading message");
    let raw = std::fs::read(&args.message)
        .with_context(|| format!("couldn't read {}", args.message.display()))?;
    let request = JobRequest::from_slice(&raw)?;

    let values = render_values(&request, &args.bucket, &args.bucket, &settings)?;
    info!("rendered chart values OK");

    std::fs::write(&args.out, values.to_yaml()?)
        .with_context(|| format!("couldn't write {}", args.out.display()))?;
    info!("finished :)");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Render(args) => render(args),
    }
}

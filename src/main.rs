mod cli;
mod config;
mod error;
mod output;
mod pipeline;
mod probe;
mod report;
mod simulate;
mod workflow;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting preflight - CI Workflow Readiness Check");
    cli.execute().await
}

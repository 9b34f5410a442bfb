//! vmprobe - provision an Azure VM with Terraform and verify it

use std::process::ExitCode;

use clap::Parser;
use vmprobe::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    Cli::parse().run().await
}

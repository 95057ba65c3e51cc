//! Flash image tool - main entry point.

use anyhow::Result;
use clap::Parser;

mod app;
mod image;

fn main() -> Result<()> {
    env_logger::init();
    let cli = app::Cli::parse();
    app::run(cli)
}

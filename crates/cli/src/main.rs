//! pan - cloud drive CLI client
//!
//! Lists, searches and bulk-manages files in a personal or family cloud
//! drive from the command line.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pancli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}

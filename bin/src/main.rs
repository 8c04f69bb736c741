mod cli;
mod handlers;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.cmd, "starting");

    if let Err(err) = handlers::handle(cli.cmd).await {
        eprintln!("{} {err}", style("error:").red().bold());
        std::process::exit(1);
    }
}

use clap::Parser;
use liveroute::cli::{run_cli, Cli};
use liveroute::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let _guard = init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}

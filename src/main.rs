//! Main entry point for tabwatch CLI

use clap::Parser;
use tabwatch::cli::Cli;
use tabwatch::commands::execute_command;

fn main() {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still takes precedence
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(e) = execute_command(cli.command, cli.config.as_deref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
